//! OpenAI adapter implementation.

use super::{bearer, Prompt, ProviderAdapter, ProviderError};
use crate::registry::ProviderKind;
use serde::Deserialize;
use serde_json::{json, Value};

/// OpenAI adapter.
///
/// Shapes calls for the OpenAI cloud API:
/// - POST /v1/chat/completions with Bearer token
/// - Answer text read from `choices[0].message.content`
#[derive(Debug, Clone)]
pub struct OpenAIAdapter {
    /// Model name (e.g., "gpt-4o-mini")
    model: String,
}

impl OpenAIAdapter {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// OpenAI /v1/chat/completions response format (fields we read)
#[derive(Deserialize)]
pub(crate) struct ChatCompletion {
    pub(crate) choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub(crate) message: ChatMessage,
}

#[derive(Deserialize)]
pub(crate) struct ChatMessage {
    #[serde(default)]
    pub(crate) content: Option<String>,
}

/// Chat-completions body shared with OpenAI-compatible servers.
pub(crate) fn chat_completion_body(model: &str, prompt: &Prompt) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": prompt.system },
            { "role": "user", "content": prompt.user },
        ],
        "temperature": 0.2,
        "stream": false,
    })
}

/// Parse a chat-completions response into the first choice's text.
pub(crate) fn parse_chat_completion(payload: Value) -> Result<String, ProviderError> {
    let completion: ChatCompletion = serde_json::from_value(payload).map_err(|e| {
        ProviderError::InvalidResponse(format!("Failed to parse completion response: {}", e))
    })?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse("Completion has no content".to_string()))
}

impl ProviderAdapter for OpenAIAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_path(&self) -> &'static str {
        "/v1/chat/completions"
    }

    fn requires_credential(&self) -> bool {
        true
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
