use crate::config::{GatewayConfig, ProviderConfig};
use crate::provider::{factory::create_adapter, ProviderAdapter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Provider family, which selects the adapter used to talk to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI cloud API
    OpenAI,
    /// Anthropic Claude API
    Anthropic,
    /// Ollama backend (<https://ollama.ai>)
    Ollama,
    /// Any OpenAI-compatible server (vLLM, llama.cpp, LM Studio, Exo)
    Generic,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Part a backend plays in the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    /// Queried on every request during fan-out
    #[default]
    Primary,
    /// Queried only on disagreement or shortfall
    Tiebreaker,
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderRole::Primary => f.write_str("primary"),
            ProviderRole::Tiebreaker => f.write_str("tiebreaker"),
        }
    }
}

/// An immutable description of one LLM backend.
///
/// Built once at startup from configuration and shared via `Arc` for the
/// lifetime of the process.
///
/// # Examples
///
/// ```
/// use verdict::config::{GatewayConfig, ProviderConfig};
/// use verdict::registry::{BackendDescriptor, ProviderKind};
///
/// let config = ProviderConfig::primary("local", "http://localhost:11434", ProviderKind::Ollama, "llama3");
/// let descriptor = BackendDescriptor::from_config(&config, &GatewayConfig::default());
///
/// assert_eq!(descriptor.id, "local");
/// assert_eq!(descriptor.max_attempts, 3);
/// ```
#[derive(Debug, Clone)]
pub struct BackendDescriptor {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Base URL for API requests
    pub url: String,
    /// Model name sent to the backend
    pub model: String,
    pub kind: ProviderKind,
    pub role: ProviderRole,
    /// Key handed to the credential resolver, if the backend needs one
    pub credential_key: Option<String>,
    /// Declared USD cost of one call
    pub cost_per_call: f64,
    /// Hard wall-clock limit for a single attempt
    pub timeout: Duration,
    /// Attempt budget, first attempt included
    pub max_attempts: u32,
    pub adapter: Arc<dyn ProviderAdapter>,
}

impl BackendDescriptor {
    /// Build a descriptor, filling per-provider gaps from gateway defaults.
    pub fn from_config(config: &ProviderConfig, defaults: &GatewayConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.display_name().to_string(),
            url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            kind: config.kind,
            role: config.role,
            credential_key: config.credential_key.clone(),
            cost_per_call: config.cost_per_call,
            timeout: config
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| defaults.per_call_timeout()),
            max_attempts: config.max_retries.unwrap_or(defaults.max_retries).max(1),
            adapter: create_adapter(config.kind, &config.model),
        }
    }

    /// Full request URL: base URL joined with the adapter's endpoint path.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.url, self.adapter.endpoint_path())
    }

    /// Worst-case wall-clock time of one gateway call against this backend:
    /// every attempt times out and every backoff sleep runs to its cap.
    pub fn worst_case_duration(&self, base_delay: Duration) -> Duration {
        let mut total = self.timeout * self.max_attempts;
        for attempt in 1..self.max_attempts {
            total += backoff_delay(attempt, base_delay, self.timeout);
        }
        total
    }
}

/// Delay before the retry that follows failed attempt `attempt` (1-based):
/// `2^(attempt-1) * base`, capped at `cap`.
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(cap).min(cap)
}

/// Serializable view of a BackendDescriptor (the adapter is omitted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendView {
    pub id: String,
    pub name: String,
    pub url: String,
    pub model: String,
    pub kind: ProviderKind,
    pub role: ProviderRole,
    pub credential_key: Option<String>,
    pub cost_per_call: f64,
    pub timeout_ms: u64,
    pub max_attempts: u32,
}

impl From<&BackendDescriptor> for BackendView {
    fn from(descriptor: &BackendDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            url: descriptor.url.clone(),
            model: descriptor.model.clone(),
            kind: descriptor.kind,
            role: descriptor.role,
            credential_key: descriptor.credential_key.clone(),
            cost_per_call: descriptor.cost_per_call,
            timeout_ms: descriptor.timeout.as_millis() as u64,
            max_attempts: descriptor.max_attempts,
        }
    }
}
