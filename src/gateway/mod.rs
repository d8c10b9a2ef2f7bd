//! Provider Gateway module.
//!
//! Executes one query against one backend and reports the outcome as data.
//! Every failure mode (transport, HTTP status, parsing, credentials,
//! cancellation) ends up in a [`ProviderResult`]; the gateway never returns
//! an error or panics.

mod http;

pub use http::{parse_retry_after, HttpGateway};

use crate::provider::ErrorKind;
use crate::query::QueryRequest;
use crate::registry::BackendDescriptor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Outcome of one provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderOutcome {
    Ok {
        text: String,
        /// Wall-clock duration of the call, retries included
        latency_ms: u64,
        /// Self-reported confidence in [0, 1], when the text carried one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

/// Result of calling one backend for one request.
///
/// Produced exactly once per backend per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub backend_id: String,
    pub outcome: ProviderOutcome,
    /// Attempts that were started (0 when the call never reached the network)
    pub attempts: u32,
    /// Declared cost charged for this call
    pub cost: f64,
}

impl ProviderResult {
    pub fn success(
        backend_id: impl Into<String>,
        text: impl Into<String>,
        latency_ms: u64,
        confidence: Option<f64>,
    ) -> Self {
        Self {
            backend_id: backend_id.into(),
            outcome: ProviderOutcome::Ok {
                text: text.into(),
                latency_ms,
                confidence,
            },
            attempts: 1,
            cost: 0.0,
        }
    }

    pub fn failure(backend_id: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
            outcome: ProviderOutcome::Error {
                kind,
                message: message.into(),
            },
            attempts: 0,
            cost: 0.0,
        }
    }

    /// Placeholder for a call abandoned at the pipeline deadline.
    pub fn cancelled(backend_id: impl Into<String>) -> Self {
        Self::failure(backend_id, ErrorKind::Cancelled, "abandoned at pipeline deadline")
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProviderOutcome::Ok { .. })
    }

    /// Response text of a successful call.
    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            ProviderOutcome::Ok { text, .. } => Some(text),
            ProviderOutcome::Error { .. } => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match &self.outcome {
            ProviderOutcome::Ok { confidence, .. } => *confidence,
            ProviderOutcome::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            ProviderOutcome::Ok { .. } => None,
            ProviderOutcome::Error { kind, .. } => Some(*kind),
        }
    }

    /// Label used for the `outcome` metric dimension.
    pub fn outcome_label(&self) -> &'static str {
        self.error_kind().map(|k| k.as_str()).unwrap_or("ok")
    }
}

/// One `call` capability shared by primaries and the tiebreaker.
///
/// The HTTP implementation is [`HttpGateway`]; tests substitute scripted
/// gateways to drive the coordinator without a network.
#[async_trait]
pub trait ProviderGateway: Send + Sync + 'static {
    /// Call `descriptor` for `request`, observing `cancel`.
    async fn call(
        &self,
        descriptor: &BackendDescriptor,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> ProviderResult;
}
