//! Adapter factory for creating ProviderAdapter trait objects from configuration.

use super::{
    anthropic::AnthropicAdapter, generic::GenericAdapter, ollama::OllamaAdapter,
    openai::OpenAIAdapter, ProviderAdapter,
};
use crate::registry::ProviderKind;
use std::sync::Arc;

/// Create an adapter for a provider family.
///
/// # Examples
///
/// ```
/// use verdict::provider::factory::create_adapter;
/// use verdict::registry::ProviderKind;
///
/// let adapter = create_adapter(ProviderKind::Ollama, "llama3");
/// assert_eq!(adapter.model(), "llama3");
/// assert_eq!(adapter.endpoint_path(), "/api/chat");
/// ```
pub fn create_adapter(kind: ProviderKind, model: &str) -> Arc<dyn ProviderAdapter> {
    match kind {
        ProviderKind::OpenAI => Arc::new(OpenAIAdapter::new(model)),
        ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(model)),
        ProviderKind::Ollama => Arc::new(OllamaAdapter::new(model)),
        ProviderKind::Generic => Arc::new(GenericAdapter::new(model)),
    }
}
