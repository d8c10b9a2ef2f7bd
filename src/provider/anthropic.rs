//! Anthropic Claude adapter implementation.
//!
//! Shapes the provider-neutral prompt into the Anthropic Messages API format.

use super::{Prompt, ProviderAdapter, ProviderError};
use crate::registry::ProviderKind;
use serde::Deserialize;
use serde_json::{json, Value};

/// API version header value sent with every request.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Upper bound on generated tokens; diagnostic answers are short.
const MAX_TOKENS: u32 = 1024;

/// Anthropic adapter.
///
/// - POST /v1/messages with `x-api-key` and `anthropic-version` headers
/// - System prompt carried in the top-level `system` field
/// - Answer text is the concatenation of all `text` content blocks
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    model: String,
}

impl AnthropicAdapter {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// Anthropic response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_path(&self) -> &'static str {
        "/v1/messages"
    }

    fn requires_credential(&self) -> bool {
        true
    }

    fn auth_headers(&self, credential: Option<&str>) -> Vec<(&'static str, String)> {
        let mut headers = vec![("anthropic-version", ANTHROPIC_VERSION.to_string())];
        if let Some(key) = credential {
            headers.push(("x-api-key", key.to_string()));
        }
        headers
    }

    fn build_request(&self, prompt: &Prompt) -> Value {
        json!({
            "model": self.model,
            "system": prompt.system,
            "max_tokens": MAX_TOKENS,
            "messages": [
                { "role": "user", "content": [{ "type": "text", "text": prompt.user }] },
            ],
        })
    }

    fn parse_response(&self, payload: Value) -> Result<String, ProviderError> {
        let response: AnthropicResponse = serde_json::from_value(payload).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Anthropic response: {}", e))
        })?;

        let text = response
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "Anthropic response has no text content".to_string(),
            ));
        }
        Ok(text)
    }
}
