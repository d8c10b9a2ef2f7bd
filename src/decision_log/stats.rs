//! Aggregate statistics over decision entries.

use super::DecisionLogEntry;
use crate::safety::SafetyStatus;
use serde::{Deserialize, Serialize};

/// Cost, latency, and outcome summary of a set of decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionStats {
    pub total: usize,
    pub approved: usize,
    pub escalated: usize,
    pub rejected: usize,
    /// USD
    pub total_cost: f64,
    pub mean_cost: f64,
    pub mean_latency_ms: f64,
    pub max_latency_ms: u64,
    /// Share of decisions that consulted the tiebreaker, in [0, 1]
    pub tiebreaker_rate: f64,
}

impl DecisionStats {
    pub fn from_entries(entries: &[DecisionLogEntry]) -> Self {
        let mut stats = Self {
            total: entries.len(),
            ..Self::default()
        };
        if entries.is_empty() {
            return stats;
        }

        let mut latency_sum = 0u64;
        let mut tiebreaker_count = 0usize;
        for entry in entries {
            match entry.decision.status {
                SafetyStatus::Approved => stats.approved += 1,
                SafetyStatus::Escalated => stats.escalated += 1,
                SafetyStatus::Rejected => stats.rejected += 1,
            }
            stats.total_cost += entry.total_cost;
            latency_sum += entry.total_latency_ms;
            stats.max_latency_ms = stats.max_latency_ms.max(entry.total_latency_ms);
            if entry.tiebreaker_invoked() {
                tiebreaker_count += 1;
            }
        }

        let n = entries.len() as f64;
        stats.mean_cost = stats.total_cost / n;
        stats.mean_latency_ms = latency_sum as f64 / n;
        stats.tiebreaker_rate = tiebreaker_count as f64 / n;
        stats
    }
}
