//! Fan-out Coordinator.
//!
//! Drives one query through the whole pipeline: concurrent primary calls
//! under a shared deadline, consensus analysis, tiebreaker escalation,
//! safety gating, and the decision log append.

mod error;

pub use error::PipelineError;

use crate::config::VerdictConfig;
use crate::consensus::{ConsensusAnalyzer, ConsensusVerdict, Resolution};
use crate::decision_log::{DecisionLogEntry, DecisionStore};
use crate::gateway::{ProviderGateway, ProviderResult};
use crate::logging::content_preview;
use crate::query::QueryRequest;
use crate::registry::{BackendDescriptor, ProviderRegistry};
use crate::safety::{GateInput, PendingReview, SafetyGate};
use crate::tiebreaker::{EscalationReason, TiebreakerEscalator};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Time given to in-flight calls to report after the deadline cancels them.
const CANCEL_GRACE: Duration = Duration::from_millis(100);

/// Runs queries against the configured backends.
///
/// Holds only immutable state plus the injected store, so one coordinator
/// can serve concurrent runs.
pub struct Coordinator {
    registry: Arc<ProviderRegistry>,
    gateway: Arc<dyn ProviderGateway>,
    analyzer: ConsensusAnalyzer,
    tiebreaker: TiebreakerEscalator,
    gate: SafetyGate,
    store: Arc<dyn DecisionStore>,
    min_successful_primaries: usize,
    base_delay: Duration,
    enable_content_logging: bool,
}

impl Coordinator {
    pub fn new(
        config: &VerdictConfig,
        registry: Arc<ProviderRegistry>,
        gateway: Arc<dyn ProviderGateway>,
        store: Arc<dyn DecisionStore>,
    ) -> Self {
        let tiebreaker = TiebreakerEscalator::new(registry.tiebreaker(), gateway.clone());
        Self {
            analyzer: ConsensusAnalyzer::new(&config.consensus),
            gate: SafetyGate::new(&config.safety),
            min_successful_primaries: config.consensus.min_successful_primaries,
            base_delay: config.gateway.base_delay(),
            enable_content_logging: config.logging.enable_content_logging,
            registry,
            gateway,
            tiebreaker,
            store,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Overall fan-out deadline: the slowest primary's worst case.
    pub fn deadline_budget(&self) -> Duration {
        self.registry
            .primaries()
            .iter()
            .map(|d| d.worst_case_duration(self.base_delay))
            .max()
            .unwrap_or_default()
    }

    /// Run the pipeline for `request`.
    ///
    /// # Errors
    ///
    /// - `PipelineError::NoProviderAvailable` when nothing answered; no entry is written
    /// - `PipelineError::Store` when the decision could not be recorded
    pub async fn run(&self, request: &QueryRequest) -> Result<DecisionLogEntry, PipelineError> {
        self.run_with_cancel(request, &CancellationToken::new()).await
    }

    /// Run the pipeline, abandoning all provider calls once `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<DecisionLogEntry, PipelineError> {
        let span = tracing::info_span!("pipeline", request_id = %request.id);
        async {
            let started = Instant::now();
            let result = self.execute(request, cancel, started).await;

            let status = match &result {
                Ok(entry) => entry.decision.status.as_str(),
                Err(e) => e.metric_label(),
            };
            metrics::counter!("verdict_queries_total", "status" => status).increment(1);
            metrics::histogram!("verdict_pipeline_duration_seconds")
                .record(started.elapsed().as_secs_f64());

            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<DecisionLogEntry, PipelineError> {
        let primaries = self.registry.primaries();
        tracing::info!(
            primaries = primaries.len(),
            tiebreaker = self.tiebreaker.is_configured(),
            "Pipeline started"
        );

        let primary_results = self.fan_out(request, &primaries, cancel).await;
        let successes = primary_results.iter().filter(|r| r.is_success()).count();

        let mut tiebreaker_result = None;
        let verdict = if successes < self.min_successful_primaries {
            tracing::warn!(
                successes,
                required = self.min_successful_primaries,
                "Primary shortfall, skipping consensus"
            );
            let escalation = self
                .tiebreaker
                .escalate(request, EscalationReason::Shortfall, &cancel.child_token())
                .await;
            let answered = escalation.as_ref().is_some_and(|r| r.is_success());
            tiebreaker_result = escalation;

            if answered {
                None
            } else {
                match self.best_primary(&primary_results) {
                    Some((text, confidence)) => {
                        tracing::warn!("Tiebreaker unavailable, using unverified primary answer");
                        Some(ConsensusVerdict::unverified(text, confidence))
                    }
                    None => {
                        tracing::warn!(primaries = primaries.len(), "No provider available");
                        return Err(PipelineError::NoProviderAvailable {
                            primaries: primaries.len(),
                            tiebreaker: if self.tiebreaker.is_configured() {
                                "failed"
                            } else {
                                "not configured"
                            },
                        });
                    }
                }
            }
        } else {
            let verdict = self.analyzer.analyze(&primary_results);
            metrics::histogram!("verdict_consensus_score").record(verdict.score);

            if verdict.agreed {
                Some(verdict)
            } else {
                let escalation = self
                    .tiebreaker
                    .escalate(request, EscalationReason::Disagreement, &cancel.child_token())
                    .await;
                let resolved = match escalation.as_ref().and_then(|r| r.text().map(|t| (r, t))) {
                    Some((result, text)) => verdict.resolved_by_tiebreaker(
                        text,
                        result
                            .confidence()
                            .unwrap_or(self.analyzer.default_confidence()),
                    ),
                    None => {
                        tracing::warn!("Tiebreaker unavailable, falling back to best primary");
                        let (text, confidence) = self
                            .best_primary(&primary_results)
                            .unwrap_or_default();
                        verdict.fallback(text, confidence)
                    }
                };
                tiebreaker_result = escalation;
                Some(resolved)
            }
        };

        let (final_answer, decision) = {
            let tiebreaker_text = tiebreaker_result.as_ref().and_then(|r| r.text());
            let primary_texts: Vec<&str> =
                primary_results.iter().filter_map(|r| r.text()).collect();

            let (final_answer, score, confidence, decisive_texts) = match &verdict {
                Some(v) => {
                    let decisive = match v.resolution {
                        Resolution::Consensus | Resolution::Fallback => primary_texts.clone(),
                        Resolution::Tiebreaker => tiebreaker_text.into_iter().collect(),
                        Resolution::Unverified => vec![v.final_answer.as_str()],
                    };
                    (v.final_answer.clone(), v.decisive_score(), v.confidence, decisive)
                }
                None => {
                    let text = tiebreaker_text.unwrap_or_default();
                    let confidence = tiebreaker_result
                        .as_ref()
                        .and_then(|r| r.confidence())
                        .unwrap_or(self.analyzer.default_confidence());
                    (text.to_string(), 1.0, confidence, vec![text])
                }
            };

            let mut all_texts = primary_texts;
            all_texts.extend(tiebreaker_text);

            let review = PendingReview::new(GateInput {
                code: request.code(),
                score,
                confidence,
                all_texts,
                decisive_texts,
            });
            (final_answer, self.gate.decide(review))
        };

        let total_cost = primary_results.iter().map(|r| r.cost).sum::<f64>()
            + tiebreaker_result.as_ref().map(|r| r.cost).unwrap_or(0.0);

        let entry = DecisionLogEntry {
            query_id: request.id,
            query_text: request.text.clone(),
            context: request.context.clone(),
            primary_results,
            tiebreaker_result,
            verdict,
            final_answer,
            decision,
            total_cost,
            total_latency_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        };

        self.store.append(&entry)?;

        tracing::info!(
            status = %entry.decision.status,
            resolution = %entry.resolution(),
            total_cost = entry.total_cost,
            total_latency_ms = entry.total_latency_ms,
            answer = ?content_preview(&entry.final_answer, self.enable_content_logging),
            "Pipeline finished"
        );

        Ok(entry)
    }

    /// Call every primary concurrently, returning one result per primary in
    /// registry order. Calls still running at the deadline are cancelled.
    async fn fan_out(
        &self,
        request: &QueryRequest,
        primaries: &[Arc<BackendDescriptor>],
        cancel: &CancellationToken,
    ) -> Vec<ProviderResult> {
        let fan_out_token = cancel.child_token();
        let deadline = tokio::time::Instant::now() + self.deadline_budget();
        let gateway = &self.gateway;

        let mut pending: FuturesUnordered<_> = primaries
            .iter()
            .enumerate()
            .map(|(idx, descriptor)| {
                let call_token = fan_out_token.child_token();
                async move { (idx, gateway.call(descriptor, request, &call_token).await) }
            })
            .collect();

        let mut results: Vec<Option<ProviderResult>> = vec![None; primaries.len()];

        let completed = tokio::time::timeout_at(deadline, async {
            while let Some((idx, result)) = pending.next().await {
                results[idx] = Some(result);
            }
        })
        .await;

        if completed.is_err() {
            tracing::warn!(
                in_flight = pending.len(),
                "Fan-out deadline reached, cancelling in-flight calls"
            );
            fan_out_token.cancel();
            let _ = tokio::time::timeout(CANCEL_GRACE, async {
                while let Some((idx, result)) = pending.next().await {
                    results[idx] = Some(result);
                }
            })
            .await;
        }
        drop(pending);

        results
            .into_iter()
            .zip(primaries)
            .map(|(result, descriptor)| {
                result.unwrap_or_else(|| {
                    ProviderResult::cancelled(&descriptor.id)
                        .with_attempts(1)
                        .with_cost(descriptor.cost_per_call)
                })
            })
            .collect()
    }

    /// Text and confidence of the most confident successful primary.
    /// Ties go to the earlier primary in registry order.
    fn best_primary(&self, results: &[ProviderResult]) -> Option<(String, f64)> {
        let default = self.analyzer.default_confidence();
        results
            .iter()
            .filter_map(|r| Some((r.text()?, r.confidence().unwrap_or(default))))
            .fold(None, |best: Option<(&str, f64)>, (text, confidence)| match best {
                Some((_, c)) if c >= confidence => best,
                _ => Some((text, confidence)),
            })
            .map(|(text, confidence)| (text.to_string(), confidence))
    }
}
