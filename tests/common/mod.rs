//! Shared test utilities for Verdict integration tests.
//!
//! Provides a scripted gateway and config builders so pipeline scenarios can
//! run without a network.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use verdict::config::{ProviderConfig, VerdictConfig};
use verdict::coordinator::Coordinator;
use verdict::decision_log::InMemoryDecisionLog;
use verdict::gateway::{ProviderGateway, ProviderResult};
use verdict::provider::ErrorKind;
use verdict::query::QueryRequest;
use verdict::registry::{BackendDescriptor, ProviderKind, ProviderRegistry};

// =============================================================================
// Scripted Gateway
// =============================================================================

/// What a scripted backend does when called.
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer immediately.
    Reply {
        text: String,
        confidence: Option<f64>,
    },
    /// Fail immediately with the given kind.
    Fail(ErrorKind),
    /// Never answer; times out after the descriptor timeout unless cancelled.
    Hang,
    /// Sleep for the given time without watching the cancellation token.
    Stuck(Duration),
}

pub fn reply(text: &str) -> Script {
    Script::Reply {
        text: text.to_string(),
        confidence: None,
    }
}

pub fn reply_with(text: &str, confidence: f64) -> Script {
    Script::Reply {
        text: text.to_string(),
        confidence: Some(confidence),
    }
}

/// Gateway answering from a per-backend script and counting calls.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: HashMap<String, Script>,
    calls: HashMap<String, AtomicU32>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, backend_id: &str, script: Script) -> Self {
        self.scripts.insert(backend_id.to_string(), script);
        self.calls.insert(backend_id.to_string(), AtomicU32::new(0));
        self
    }

    pub fn calls(&self, backend_id: &str) -> u32 {
        self.calls
            .get(backend_id)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ProviderGateway for ScriptedGateway {
    async fn call(
        &self,
        descriptor: &BackendDescriptor,
        _request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> ProviderResult {
        if let Some(counter) = self.calls.get(&descriptor.id) {
            counter.fetch_add(1, Ordering::SeqCst);
        }

        match self.scripts.get(&descriptor.id) {
            Some(Script::Reply { text, confidence }) => {
                ProviderResult::success(&descriptor.id, text, 5, *confidence)
                    .with_cost(descriptor.cost_per_call)
            }
            Some(Script::Fail(kind)) => {
                ProviderResult::failure(&descriptor.id, *kind, "scripted failure")
                    .with_attempts(1)
                    .with_cost(descriptor.cost_per_call)
            }
            Some(Script::Hang) => {
                tokio::select! {
                    _ = cancel.cancelled() => ProviderResult::failure(
                        &descriptor.id,
                        ErrorKind::Cancelled,
                        "cancelled",
                    )
                    .with_attempts(1)
                    .with_cost(descriptor.cost_per_call),
                    _ = tokio::time::sleep(descriptor.timeout) => ProviderResult::failure(
                        &descriptor.id,
                        ErrorKind::Timeout,
                        "scripted timeout",
                    )
                    .with_attempts(1)
                    .with_cost(descriptor.cost_per_call),
                }
            }
            Some(Script::Stuck(delay)) => {
                tokio::time::sleep(*delay).await;
                ProviderResult::success(&descriptor.id, "too late", delay.as_millis() as u64, None)
                    .with_cost(descriptor.cost_per_call)
            }
            None => ProviderResult::failure(&descriptor.id, ErrorKind::BadRequest, "no script"),
        }
    }
}

// =============================================================================
// Config Builders
// =============================================================================

/// Primary provider with a short timeout, one attempt, and a fixed cost.
pub fn primary(id: &str) -> ProviderConfig {
    let mut p = ProviderConfig::primary(id, "http://127.0.0.1:9", ProviderKind::Ollama, "test-model");
    p.timeout_ms = Some(200);
    p.max_retries = Some(1);
    p.cost_per_call = 0.01;
    p
}

/// Tiebreaker provider with a short timeout and a fixed cost.
pub fn tiebreaker(id: &str) -> ProviderConfig {
    let mut p =
        ProviderConfig::tiebreaker(id, "http://127.0.0.1:9", ProviderKind::Ollama, "judge-model");
    p.timeout_ms = Some(200);
    p.max_retries = Some(1);
    p.cost_per_call = 0.05;
    p
}

pub fn config(providers: Vec<ProviderConfig>) -> VerdictConfig {
    VerdictConfig {
        providers,
        ..VerdictConfig::default()
    }
}

/// Coordinator over `config` with the given gateway and an in-memory log.
pub fn coordinator(
    config: &VerdictConfig,
    gateway: Arc<dyn ProviderGateway>,
) -> (Coordinator, Arc<InMemoryDecisionLog>) {
    let registry = Arc::new(ProviderRegistry::from_config(config).unwrap());
    let store = Arc::new(InMemoryDecisionLog::new());
    (
        Coordinator::new(config, registry, gateway, store.clone()),
        store,
    )
}

/// Upper bound used to assert a run finished promptly.
pub const PROMPT_RUN: Duration = Duration::from_secs(2);
