//! Ollama adapter implementation.

use super::{Prompt, ProviderAdapter, ProviderError};
use crate::registry::ProviderKind;
use serde::Deserialize;
use serde_json::{json, Value};

/// Ollama adapter.
///
/// - POST /api/chat with `stream: false`
/// - Answer text read from `message.content`
/// - No authentication
#[derive(Debug, Clone)]
pub struct OllamaAdapter {
    model: String,
}

impl OllamaAdapter {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// Ollama /api/chat response format
#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

impl ProviderAdapter for OllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_path(&self) -> &'static str {
        "/api/chat"
    }

    fn auth_headers(&self, _credential: Option<&str>) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn build_request(&self, prompt: &Prompt) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "stream": false,
            "options": { "temperature": 0.2 },
        })
    }

    fn parse_response(&self, payload: Value) -> Result<String, ProviderError> {
        let response: OllamaChatResponse = serde_json::from_value(payload).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
        })?;

        if response.message.content.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "Ollama response has empty content".to_string(),
            ));
        }
        Ok(response.message.content)
    }
}
