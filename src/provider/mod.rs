//! Provider adapter layer.
//!
//! This module provides the `ProviderAdapter` trait that isolates each LLM
//! vendor's request/response shape, so the gateway can call any backend
//! without branching on its type.

pub mod anthropic;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod generic;
pub mod ollama;
pub mod openai;
pub mod prompt;

pub use credentials::{
    CredentialError, CredentialResolver, EnvCredentialResolver, StaticCredentialResolver,
};
pub use error::{ErrorKind, ProviderError};
pub use prompt::{extract_confidence, strip_confidence, Prompt};

use crate::registry::ProviderKind;
use serde_json::Value;

/// Provider-specific request shaping and response parsing.
///
/// Adapters are pure: they never perform I/O. The gateway owns the HTTP
/// client, timeouts, and retries.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn ProviderAdapter>`,
/// one instance per backend descriptor.
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug + 'static {
    /// Provider family implemented by this adapter.
    fn kind(&self) -> ProviderKind;

    /// Model name sent with every request.
    fn model(&self) -> &str;

    /// Path appended to the descriptor's base URL (e.g., "/v1/chat/completions").
    fn endpoint_path(&self) -> &'static str;

    /// Whether a call without a resolved credential is pointless.
    fn requires_credential(&self) -> bool {
        false
    }

    /// Authentication headers for a resolved credential.
    fn auth_headers(&self, credential: Option<&str>) -> Vec<(&'static str, String)>;

    /// Build the JSON request body for a prompt.
    fn build_request(&self, prompt: &Prompt) -> Value;

    /// Extract the answer text from a JSON response body.
    ///
    /// # Returns
    ///
    /// - `Ok(String)` with the assistant's text
    /// - `Err(ProviderError::InvalidResponse)` if the body doesn't match the provider format
    fn parse_response(&self, payload: Value) -> Result<String, ProviderError>;
}

/// Bearer authorization header shared by the OpenAI-style adapters.
pub(crate) fn bearer(credential: Option<&str>) -> Vec<(&'static str, String)> {
    credential
        .map(|key| vec![("authorization", format!("Bearer {}", key))])
        .unwrap_or_default()
}
