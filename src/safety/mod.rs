//! Safety Gate module.
//!
//! Classifies a resolved answer as approved, escalated for human review, or
//! rejected. The gate only looks at data; it never touches the network.
//!
//! A [`PendingReview`] is the only non-terminal state. Deciding consumes it,
//! so a decision can never be re-evaluated or transition again.

mod escalation;
pub mod rules;

pub use escalation::generate_escalation_id;
pub use rules::{ActionClass, CodeRegistry, Denylist};

use crate::config::SafetyConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal classification of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyStatus {
    Approved,
    Escalated,
    Rejected,
}

impl SafetyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyStatus::Approved => "approved",
            SafetyStatus::Escalated => "escalated",
            SafetyStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SafetyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approved" => Ok(SafetyStatus::Approved),
            "escalated" => Ok(SafetyStatus::Escalated),
            "rejected" => Ok(SafetyStatus::Rejected),
            _ => Err(format!("Invalid safety status: {}", s)),
        }
    }
}

pub const REASON_SAFETY_VIOLATION: &str = "safety violation";
pub const REASON_UNVERIFIED_CODE: &str = "unverified code";
pub const REASON_CONFLICT: &str = "conflicting recommendations";
pub const REASON_AUTO_APPROVED: &str = "consensus and confidence above auto-approve thresholds";
pub const REASON_MODERATE: &str = "moderate confidence, human review required";
pub const REASON_INSUFFICIENT: &str = "insufficient confidence";

/// Outcome of the safety gate for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyDecision {
    pub status: SafetyStatus,
    pub reason: String,
    /// Facts that triggered the rule, e.g. the matched phrase or unknown code
    pub signals: Vec<String>,
    /// Present exactly when `status` is escalated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_id: Option<String>,
    pub decided_at: DateTime<Utc>,
}

/// Everything the gate needs to know about a resolved answer.
#[derive(Debug, Clone)]
pub struct GateInput<'a> {
    /// Diagnostic code attached to the request, if any
    pub code: Option<&'a str>,
    /// Agreement signal in [0, 1]
    pub score: f64,
    pub confidence: f64,
    /// Every response text seen, primaries and tiebreaker alike
    pub all_texts: Vec<&'a str>,
    /// Responses the final answer rests on
    pub decisive_texts: Vec<&'a str>,
}

/// An answer awaiting classification.
#[derive(Debug, Clone)]
pub struct PendingReview<'a> {
    input: GateInput<'a>,
}

impl<'a> PendingReview<'a> {
    pub fn new(input: GateInput<'a>) -> Self {
        Self { input }
    }
}

/// Rule-based safety gate; rules are applied in order and the first match wins.
#[derive(Debug, Clone)]
pub struct SafetyGate {
    auto_approve_consensus: f64,
    auto_approve_confidence: f64,
    escalate_consensus: f64,
    escalate_confidence: f64,
    denylist: Denylist,
    codes: CodeRegistry,
}

/// Classification without the time- and randomness-dependent parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: SafetyStatus,
    pub reason: &'static str,
    pub signals: Vec<String>,
}

impl SafetyGate {
    pub fn new(config: &SafetyConfig) -> Self {
        Self {
            auto_approve_consensus: config.auto_approve_consensus_threshold,
            auto_approve_confidence: config.auto_approve_confidence_threshold,
            escalate_consensus: config.escalate_consensus_threshold,
            escalate_confidence: config.escalate_confidence_threshold,
            denylist: Denylist::new(&config.denylist),
            codes: CodeRegistry::new(config.builtin_codes, &config.known_codes),
        }
    }

    /// Apply the rules to `input`. Deterministic.
    pub fn classify(&self, input: &GateInput<'_>) -> Classification {
        if let Some(phrase) = input.all_texts.iter().find_map(|t| self.denylist.find(t)) {
            return Classification {
                status: SafetyStatus::Rejected,
                reason: REASON_SAFETY_VIOLATION,
                signals: vec![format!("denylisted phrase: {}", phrase)],
            };
        }

        if let Some(code) = input.code {
            if !self.codes.contains(code) {
                return Classification {
                    status: SafetyStatus::Escalated,
                    reason: REASON_UNVERIFIED_CODE,
                    signals: vec![format!("unknown code: {}", code)],
                };
            }
        }

        if let Some((a, b)) = rules::find_conflict(input.decisive_texts.iter().copied()) {
            return Classification {
                status: SafetyStatus::Escalated,
                reason: REASON_CONFLICT,
                signals: vec![format!("conflict: {} vs {}", a.as_str(), b.as_str())],
            };
        }

        let signals = vec![
            format!("score: {:.3}", input.score),
            format!("confidence: {:.3}", input.confidence),
        ];

        let (status, reason) = if input.score >= self.auto_approve_consensus
            && input.confidence >= self.auto_approve_confidence
        {
            (SafetyStatus::Approved, REASON_AUTO_APPROVED)
        } else if input.score >= self.escalate_consensus
            && input.confidence >= self.escalate_confidence
        {
            (SafetyStatus::Escalated, REASON_MODERATE)
        } else {
            (SafetyStatus::Rejected, REASON_INSUFFICIENT)
        };

        Classification {
            status,
            reason,
            signals,
        }
    }

    /// Consume a pending review into its terminal decision.
    pub fn decide(&self, review: PendingReview<'_>) -> SafetyDecision {
        let classification = self.classify(&review.input);
        let decided_at = Utc::now();
        let escalation_id = (classification.status == SafetyStatus::Escalated)
            .then(|| generate_escalation_id(decided_at));

        tracing::info!(
            status = %classification.status,
            reason = classification.reason,
            escalation_id = ?escalation_id,
            "Safety decision"
        );

        SafetyDecision {
            status: classification.status,
            reason: classification.reason.to_string(),
            signals: classification.signals,
            escalation_id,
            decided_at,
        }
    }
}
