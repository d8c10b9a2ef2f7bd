//! Generic OpenAI-compatible adapter (vLLM, llama.cpp, LM Studio, Exo).

use super::openai::{chat_completion_body, parse_chat_completion};
use super::{bearer, Prompt, ProviderAdapter, ProviderError};
use crate::registry::ProviderKind;
use serde_json::Value;

/// Adapter for self-hosted servers speaking the OpenAI chat-completions
/// format. A credential is optional and sent as a Bearer token when present.
#[derive(Debug, Clone)]
pub struct GenericAdapter {
    model: String,
}

impl GenericAdapter {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl ProviderAdapter for GenericAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Generic
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_path(&self) -> &'static str {
        "/v1/chat/completions"
    }

    fn auth_headers(&self, credential: Option<&str>) -> Vec<(&'static str, String)> {
        bearer(credential)
    }

    fn build_request(&self, prompt: &Prompt) -> Value {
        chat_completion_body(&self.model, prompt)
    }

    fn parse_response(&self, payload: Value) -> Result<String, ProviderError> {
        parse_chat_completion(payload)
    }
}
