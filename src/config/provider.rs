//! Provider configuration

use crate::registry::{ProviderKind, ProviderRole};
use serde::{Deserialize, Serialize};

/// One `[[providers]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    pub model: String,
    #[serde(default)]
    pub role: ProviderRole,
    /// Declared USD cost of one call.
    #[serde(default)]
    pub cost_per_call: f64,
    /// Key handed to the credential resolver (an env var name by default).
    #[serde(default)]
    pub credential_key: Option<String>,
    /// Overrides `gateway.per_call_timeout_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Overrides `gateway.max_retries`.
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl ProviderConfig {
    /// Minimal primary provider entry, mostly for tests and CLI defaults.
    pub fn primary(id: &str, url: &str, kind: ProviderKind, model: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            url: url.to_string(),
            kind,
            model: model.to_string(),
            role: ProviderRole::Primary,
            cost_per_call: 0.0,
            credential_key: None,
            timeout_ms: None,
            max_retries: None,
        }
    }

    pub fn tiebreaker(id: &str, url: &str, kind: ProviderKind, model: &str) -> Self {
        Self {
            role: ProviderRole::Tiebreaker,
            ..Self::primary(id, url, kind, model)
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
