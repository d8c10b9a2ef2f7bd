//! Provider-neutral prompt construction and confidence extraction.

use crate::query::QueryRequest;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Instructions sent to every provider ahead of the user's question.
pub const SYSTEM_PROMPT: &str = "You are an automotive diagnostic assistant. \
Name the most likely failing components, the symptoms that point to them, and \
the recommended action. Never recommend bypassing, disabling, or removing a \
safety system. End your answer with a line of the form \
'Confidence: <number between 0 and 1>'.";

static CONFIDENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)confidence(?:\s+level)?\s*[:=]?\s*(\d{1,3}(?:\.\d+)?)\s*(%)?")
        .expect("CONFIDENCE_RE regex should compile")
});

/// System and user text for one query, before any provider-specific shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Build the prompt for a query, appending any structured context.
    ///
    /// # Examples
    ///
    /// ```
    /// use verdict::provider::prompt::Prompt;
    /// use verdict::query::{QueryContext, QueryRequest};
    ///
    /// let request = QueryRequest::new("Rough idle when cold")
    ///     .with_context(QueryContext::with_code("P0301"));
    /// let prompt = Prompt::for_query(&request);
    ///
    /// assert!(prompt.user.starts_with("Rough idle when cold"));
    /// assert!(prompt.user.contains("Diagnostic code: P0301"));
    /// ```
    pub fn for_query(request: &QueryRequest) -> Self {
        let mut user = request.text.trim().to_string();

        if let Some(context) = &request.context {
            if let Some(code) = &context.code {
                user.push_str(&format!("\n\nDiagnostic code: {}", code));
            }
            if !context.attributes.is_empty() {
                user.push_str("\n\nVehicle details:");
                for (key, value) in &context.attributes {
                    user.push_str(&format!("\n- {}: {}", key, value));
                }
            }
        }

        Self {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}

/// Extract the self-reported confidence from a response, if present.
///
/// The last `Confidence: x` marker wins. Values above 1 or followed by `%`
/// are read as percentages. The result is clamped to [0, 1].
pub fn extract_confidence(text: &str) -> Option<f64> {
    let caps = CONFIDENCE_RE.captures_iter(text).last()?;
    let mut value: f64 = caps.get(1)?.as_str().parse().ok()?;

    if caps.get(2).is_some() || value > 1.0 {
        value /= 100.0;
    }

    Some(value.clamp(0.0, 1.0))
}

/// The response with every `Confidence: x` marker removed.
///
/// Every provider is asked to end with the marker, so it carries no signal
/// when comparing answers.
pub fn strip_confidence(text: &str) -> Cow<'_, str> {
    CONFIDENCE_RE.replace_all(text, "")
}
