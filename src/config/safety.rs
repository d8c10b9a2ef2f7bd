//! Safety gate configuration

use serde::{Deserialize, Serialize};

/// Thresholds and rule data for the safety gate.
///
/// # Example
///
/// ```toml
/// [safety]
/// auto_approve_consensus_threshold = 0.7
/// auto_approve_confidence_threshold = 0.7
/// escalate_consensus_threshold = 0.4
/// escalate_confidence_threshold = 0.4
/// denylist = ["pull the fuse for the airbag"]
/// known_codes = ["P1456"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Minimum consensus score for automatic approval.
    pub auto_approve_consensus_threshold: f64,
    /// Minimum mean confidence for automatic approval.
    pub auto_approve_confidence_threshold: f64,
    /// Minimum consensus score for human review instead of rejection.
    pub escalate_consensus_threshold: f64,
    /// Minimum mean confidence for human review instead of rejection.
    pub escalate_confidence_threshold: f64,
    /// Unsafe phrases added to the built-in denylist.
    pub denylist: Vec<String>,
    /// Diagnostic codes accepted in addition to the built-in registry.
    pub known_codes: Vec<String>,
    /// Whether the built-in code registry is loaded at all.
    pub builtin_codes: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            auto_approve_consensus_threshold: 0.70,
            auto_approve_confidence_threshold: 0.70,
            escalate_consensus_threshold: 0.40,
            escalate_confidence_threshold: 0.40,
            denylist: Vec::new(),
            known_codes: Vec::new(),
            builtin_codes: true,
        }
    }
}
