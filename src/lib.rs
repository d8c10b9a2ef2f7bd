//! Verdict - multi-provider LLM consensus with safety gating
//!
//! This library fans a single diagnostic query out to several independent
//! language-model backends, scores how closely their answers agree, escalates
//! to a tiebreaker backend when they do not, and classifies the outcome as
//! approved, escalated for human review, or rejected.

pub mod cli;
pub mod config;
pub mod consensus;
pub mod coordinator;
pub mod decision_log;
pub mod gateway;
pub mod logging;
pub mod provider;
pub mod query;
pub mod registry;
pub mod safety;
pub mod tiebreaker;
