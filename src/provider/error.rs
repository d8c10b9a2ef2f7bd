//! Error types for provider calls.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::credentials::CredentialError;

/// Errors that can occur while calling a provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network connectivity error (DNS, connection refused, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// Attempt exceeded its deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Provider returned an error response (4xx, 5xx).
    #[error("Provider error {status}: {message}")]
    Upstream {
        status: u16,
        message: String,
        /// Delay requested by a `Retry-After` header, if any.
        retry_after: Option<Duration>,
    },

    /// Provider response doesn't match the adapter's expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Credential could not be resolved.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Descriptor is unusable as configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The call was abandoned by its caller.
    #[error("Call cancelled")]
    Cancelled,
}

/// Coarse failure classification recorded in a `ProviderResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Network,
    Server,
    RateLimited,
    Authentication,
    BadRequest,
    InvalidResponse,
    Credential,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Authentication => "authentication",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::Credential => "credential",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Network(_) => ErrorKind::Network,
            ProviderError::Timeout(_) => ErrorKind::Timeout,
            ProviderError::Upstream { status, .. } => match *status {
                429 => ErrorKind::RateLimited,
                401 | 403 => ErrorKind::Authentication,
                s if s >= 500 => ErrorKind::Server,
                _ => ErrorKind::BadRequest,
            },
            ProviderError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            ProviderError::Credential(_) | ProviderError::Configuration(_) => {
                ErrorKind::Credential
            }
            ProviderError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether another attempt against the same provider may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Timeout | ErrorKind::Network | ErrorKind::Server | ErrorKind::RateLimited
        )
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::Upstream { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(timeout_ms)
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}
