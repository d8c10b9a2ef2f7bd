//! Configuration module for Verdict
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`VERDICT_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use verdict::config::VerdictConfig;
//!
//! let config = VerdictConfig::default();
//! assert_eq!(config.consensus.agreement_threshold, 0.75);
//!
//! let toml = r#"
//! [consensus]
//! agreement_threshold = 0.8
//! "#;
//! let config: VerdictConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.consensus.agreement_threshold, 0.8);
//! assert_eq!(config.gateway.max_retries, 3);
//! ```

pub mod consensus;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod provider;
pub mod safety;

pub use consensus::ConsensusConfig;
pub use error::ConfigError;
pub use gateway::GatewayConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use provider::ProviderConfig;
pub use safety::SafetyConfig;

use crate::registry::ProviderRole;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Annotated example configuration written by `verdict config init`.
pub const EXAMPLE_CONFIG: &str = include_str!("../../verdict.example.toml");

/// Unified configuration for the consensus pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VerdictConfig {
    /// Retry and timeout defaults for provider calls
    pub gateway: GatewayConfig,
    /// Agreement thresholds
    pub consensus: ConsensusConfig,
    /// Safety gate thresholds and rule data
    pub safety: SafetyConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Static provider definitions
    pub providers: Vec<ProviderConfig>,
}

impl VerdictConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports VERDICT_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("VERDICT_AGREEMENT_THRESHOLD") {
            if let Ok(v) = value.parse() {
                self.consensus.agreement_threshold = v;
            }
        }
        if let Ok(value) = std::env::var("VERDICT_PER_CALL_TIMEOUT_MS") {
            if let Ok(v) = value.parse() {
                self.gateway.per_call_timeout_ms = v;
            }
        }
        if let Ok(value) = std::env::var("VERDICT_MAX_RETRIES") {
            if let Ok(v) = value.parse() {
                self.gateway.max_retries = v;
            }
        }

        if let Ok(level) = std::env::var("VERDICT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("VERDICT_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_interval = [
            (
                "consensus.agreement_threshold",
                self.consensus.agreement_threshold,
            ),
            (
                "consensus.default_confidence",
                self.consensus.default_confidence,
            ),
            (
                "safety.auto_approve_consensus_threshold",
                self.safety.auto_approve_consensus_threshold,
            ),
            (
                "safety.auto_approve_confidence_threshold",
                self.safety.auto_approve_confidence_threshold,
            ),
            (
                "safety.escalate_consensus_threshold",
                self.safety.escalate_consensus_threshold,
            ),
            (
                "safety.escalate_confidence_threshold",
                self.safety.escalate_confidence_threshold,
            ),
        ];
        for (field, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::validation(
                    field,
                    format!("must be between 0.0 and 1.0, got {}", value),
                ));
            }
        }

        if self.safety.escalate_consensus_threshold > self.safety.auto_approve_consensus_threshold
        {
            return Err(ConfigError::validation(
                "safety.escalate_consensus_threshold",
                "must not exceed auto_approve_consensus_threshold",
            ));
        }
        if self.safety.escalate_confidence_threshold
            > self.safety.auto_approve_confidence_threshold
        {
            return Err(ConfigError::validation(
                "safety.escalate_confidence_threshold",
                "must not exceed auto_approve_confidence_threshold",
            ));
        }

        if self.consensus.min_successful_primaries == 0 {
            return Err(ConfigError::validation(
                "consensus.min_successful_primaries",
                "must be at least 1",
            ));
        }
        if self.gateway.max_retries == 0 {
            return Err(ConfigError::validation(
                "gateway.max_retries",
                "attempt budget must be at least 1",
            ));
        }
        if self.gateway.per_call_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "gateway.per_call_timeout_ms",
                "timeout must be non-zero",
            ));
        }

        self.validate_providers()
    }

    fn validate_providers(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        let mut tiebreakers = 0;

        for (i, provider) in self.providers.iter().enumerate() {
            if provider.id.is_empty() {
                return Err(ConfigError::validation(
                    format!("providers[{}].id", i),
                    "id cannot be empty",
                ));
            }
            if !seen.insert(provider.id.as_str()) {
                return Err(ConfigError::validation(
                    format!("providers[{}].id", i),
                    format!("duplicate provider id '{}'", provider.id),
                ));
            }
            if provider.url.is_empty() {
                return Err(ConfigError::validation(
                    format!("providers[{}].url", i),
                    "URL cannot be empty",
                ));
            }
            if provider.model.is_empty() {
                return Err(ConfigError::validation(
                    format!("providers[{}].model", i),
                    "model cannot be empty",
                ));
            }
            if !provider.cost_per_call.is_finite() || provider.cost_per_call < 0.0 {
                return Err(ConfigError::validation(
                    format!("providers[{}].cost_per_call", i),
                    "cost must be a non-negative number",
                ));
            }
            if provider.max_retries == Some(0) {
                return Err(ConfigError::validation(
                    format!("providers[{}].max_retries", i),
                    "attempt budget must be at least 1",
                ));
            }
            if provider.timeout_ms == Some(0) {
                return Err(ConfigError::validation(
                    format!("providers[{}].timeout_ms", i),
                    "timeout must be non-zero",
                ));
            }
            if provider.role == ProviderRole::Tiebreaker {
                tiebreakers += 1;
            }
        }

        if tiebreakers > 1 {
            return Err(ConfigError::validation(
                "providers",
                "at most one provider may have role = \"tiebreaker\"",
            ));
        }

        Ok(())
    }

    /// Validate and additionally require at least one primary provider.
    ///
    /// Used by commands that actually run the pipeline.
    pub fn validate_for_run(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if !self
            .providers
            .iter()
            .any(|p| p.role == ProviderRole::Primary)
        {
            return Err(ConfigError::MissingField(
                "providers (at least one primary)".to_string(),
            ));
        }
        Ok(())
    }
}
