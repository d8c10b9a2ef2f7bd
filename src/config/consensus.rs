//! Consensus configuration

use serde::{Deserialize, Serialize};

/// Thresholds controlling when primary responses count as agreeing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Composite score at or above which responses are considered agreed.
    ///
    /// Default: 0.75
    pub agreement_threshold: f64,

    /// Successful primaries needed before the analyzer runs; below this the
    /// tiebreaker answers directly.
    ///
    /// Default: 2
    pub min_successful_primaries: usize,

    /// Confidence assumed for a response that does not report one.
    ///
    /// Default: 0.8
    pub default_confidence: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            agreement_threshold: 0.75,
            min_successful_primaries: 2,
            default_confidence: 0.8,
        }
    }
}
