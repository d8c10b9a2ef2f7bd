//! Credential resolution.
//!
//! Descriptors carry only a credential key; the secret itself is looked up
//! per call through a [`CredentialResolver`] and never stored by the pipeline.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("credential '{0}' not found")]
    NotFound(String),

    #[error("credential '{key}' unavailable: {message}")]
    Unavailable { key: String, message: String },
}

/// Lookup of secrets by key, backed by whatever secret store the
/// embedding application uses.
#[async_trait]
pub trait CredentialResolver: Send + Sync + 'static {
    async fn resolve(&self, key: &str) -> Result<String, CredentialError>;
}

/// Resolves a credential key as the name of an environment variable.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentialResolver;

#[async_trait]
impl CredentialResolver for EnvCredentialResolver {
    async fn resolve(&self, key: &str) -> Result<String, CredentialError> {
        match std::env::var(key) {
            Ok(value) if !value.is_empty() => Ok(value),
            Ok(_) => Err(CredentialError::Unavailable {
                key: key.to_string(),
                message: "environment variable is empty".to_string(),
            }),
            Err(std::env::VarError::NotPresent) => Err(CredentialError::NotFound(key.to_string())),
            Err(e) => Err(CredentialError::Unavailable {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// Fixed in-memory credentials.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentialResolver {
    values: HashMap<String, String>,
}

impl StaticCredentialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl CredentialResolver for StaticCredentialResolver {
    async fn resolve(&self, key: &str) -> Result<String, CredentialError> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| CredentialError::NotFound(key.to_string()))
    }
}
