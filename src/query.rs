//! Query types identifying one pipeline run end-to-end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Structured context attached to a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    /// Diagnostic trouble code (e.g., "P0301"), upper-cased on construction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Free-form attributes such as vehicle make or mileage.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl QueryContext {
    /// Context carrying only a diagnostic code.
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(normalize_code(&code.into())),
            attributes: BTreeMap::new(),
        }
    }

    /// Add a free-form attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.attributes.is_empty()
    }
}

/// A single diagnostic question submitted to the pipeline.
///
/// Immutable once created; its `id` is carried through every provider call,
/// the safety decision, and the decision log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub id: Uuid,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<QueryContext>,
    pub created_at: DateTime<Utc>,
}

impl QueryRequest {
    /// Create a request with a fresh id and no context.
    ///
    /// # Examples
    ///
    /// ```
    /// use verdict::query::{QueryContext, QueryRequest};
    ///
    /// let request = QueryRequest::new("Engine stumbles at idle")
    ///     .with_context(QueryContext::with_code("p0301"));
    ///
    /// assert_eq!(request.code(), Some("P0301"));
    /// ```
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            context: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_context(mut self, context: QueryContext) -> Self {
        self.context = if context.is_empty() {
            None
        } else {
            Some(context)
        };
        self
    }

    /// The structured diagnostic code, if the request carries one.
    pub fn code(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.code.as_deref())
    }
}

/// Trim and upper-case a diagnostic code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
