//! Tiebreaker Escalator.
//!
//! A single gateway call against the designated tiebreaker backend, made
//! when primaries disagree or too few of them answered.

use crate::gateway::{ProviderGateway, ProviderResult};
use crate::query::QueryRequest;
use crate::registry::BackendDescriptor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Why the tiebreaker was consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationReason {
    /// Primaries answered but did not agree.
    Disagreement,
    /// Fewer primaries succeeded than consensus requires.
    Shortfall,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::Disagreement => "disagreement",
            EscalationReason::Shortfall => "shortfall",
        }
    }
}

pub struct TiebreakerEscalator {
    backend: Option<Arc<BackendDescriptor>>,
    gateway: Arc<dyn ProviderGateway>,
}

impl TiebreakerEscalator {
    pub fn new(backend: Option<Arc<BackendDescriptor>>, gateway: Arc<dyn ProviderGateway>) -> Self {
        Self { backend, gateway }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Ask the tiebreaker; `None` when no tiebreaker is configured.
    ///
    /// The retry policy is the tiebreaker descriptor's own. A failed call is
    /// returned as data for the caller to fall back from.
    pub async fn escalate(
        &self,
        request: &QueryRequest,
        reason: EscalationReason,
        cancel: &CancellationToken,
    ) -> Option<ProviderResult> {
        let Some(backend) = &self.backend else {
            tracing::warn!(
                request_id = %request.id,
                reason = reason.as_str(),
                "Tiebreaker needed but none is configured"
            );
            return None;
        };

        metrics::counter!(
            "verdict_tiebreaker_invocations_total",
            "reason" => reason.as_str(),
        )
        .increment(1);

        tracing::info!(
            request_id = %request.id,
            backend_id = %backend.id,
            reason = reason.as_str(),
            "Escalating to tiebreaker"
        );

        Some(self.gateway.call(backend, request, cancel).await)
    }
}
