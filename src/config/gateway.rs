//! Provider gateway defaults

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry and timeout defaults applied to every provider unless the provider
/// entry overrides them.
///
/// # Example
///
/// ```toml
/// [gateway]
/// max_retries = 3
/// per_call_timeout_ms = 30000
/// base_delay_ms = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Attempt budget per provider call (first attempt included).
    ///
    /// Default: 3
    pub max_retries: u32,

    /// Hard wall-clock limit for a single attempt.
    ///
    /// Default: 30000ms
    pub per_call_timeout_ms: u64,

    /// First backoff delay; doubles on every further retry.
    ///
    /// Default: 500ms
    pub base_delay_ms: u64,
}

impl GatewayConfig {
    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_millis(self.per_call_timeout_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            per_call_timeout_ms: 30_000,
            base_delay_ms: 500,
        }
    }
}
