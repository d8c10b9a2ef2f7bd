//! Decision Log module.
//!
//! Append-only record of every completed pipeline run. The coordinator is the
//! only writer; reporting reads snapshots through [`DecisionStore::query`].

mod jsonl;
mod memory;
mod stats;

pub use jsonl::{read_entries, JsonlDecisionLog};
pub use memory::InMemoryDecisionLog;
pub use stats::DecisionStats;

use crate::consensus::{ConsensusVerdict, Resolution};
use crate::gateway::ProviderResult;
use crate::query::QueryContext;
use crate::safety::{SafetyDecision, SafetyStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Full outcome of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub query_id: Uuid,
    pub query_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<QueryContext>,
    /// One result per primary backend, in registry order
    pub primary_results: Vec<ProviderResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiebreaker_result: Option<ProviderResult>,
    /// Absent only when the tiebreaker answered a primary shortfall
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<ConsensusVerdict>,
    pub final_answer: String,
    pub decision: SafetyDecision,
    /// USD
    pub total_cost: f64,
    pub total_latency_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl DecisionLogEntry {
    /// How the final answer was chosen.
    pub fn resolution(&self) -> Resolution {
        self.verdict
            .as_ref()
            .map(|v| v.resolution)
            .unwrap_or(Resolution::Tiebreaker)
    }

    pub fn tiebreaker_invoked(&self) -> bool {
        self.tiebreaker_result.is_some()
    }

    pub fn status(&self) -> SafetyStatus {
        self.decision.status
    }
}

/// Selection criteria for [`DecisionStore::query`]; empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionFilter {
    pub status: Option<SafetyStatus>,
    pub query_id: Option<Uuid>,
    /// Entries at or after this instant
    pub since: Option<DateTime<Utc>>,
}

impl DecisionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: SafetyStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_query_id(mut self, query_id: Uuid) -> Self {
        self.query_id = Some(query_id);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn matches(&self, entry: &DecisionLogEntry) -> bool {
        self.status.is_none_or(|s| entry.decision.status == s)
            && self.query_id.is_none_or(|id| entry.query_id == id)
            && self.since.is_none_or(|t| entry.timestamp >= t)
    }
}

/// Errors from decision persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("decision log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode decision entry: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("corrupt decision log entry at line {line}: {message}")]
    Corrupt { line: usize, message: String },

    #[error("decision log lock poisoned")]
    Poisoned,
}

/// Append-only persistence for decision entries.
///
/// Each `append` is atomic: a concurrent reader sees either the whole entry or none of it.
pub trait DecisionStore: Send + Sync + 'static {
    fn append(&self, entry: &DecisionLogEntry) -> Result<(), StoreError>;

    /// Snapshot of the entries matching `filter`, in append order.
    fn query(&self, filter: &DecisionFilter) -> Result<Vec<DecisionLogEntry>, StoreError>;
}
