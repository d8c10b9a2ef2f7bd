//! Provider Registry module.
//!
//! Static, lookup-only table of the backends a pipeline can call.

mod backend;
mod error;

pub use backend::*;
pub use error::*;

use crate::config::VerdictConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// The Provider Registry stores every configured backend.
///
/// Descriptors are immutable after construction; the registry hands out
/// `Arc` clones so fan-out tasks can hold them without borrowing the registry.
/// Iteration follows insertion order, which is the order of `[[providers]]`
/// entries in the configuration file.
///
/// # Examples
///
/// ```
/// use verdict::config::{GatewayConfig, ProviderConfig};
/// use verdict::registry::{BackendDescriptor, ProviderKind, ProviderRegistry};
///
/// let mut registry = ProviderRegistry::new();
/// let config = ProviderConfig::primary("local", "http://localhost:11434", ProviderKind::Ollama, "llama3");
/// registry
///     .add(BackendDescriptor::from_config(&config, &GatewayConfig::default()))
///     .unwrap();
///
/// assert_eq!(registry.len(), 1);
/// assert_eq!(registry.primaries().len(), 1);
/// assert!(registry.tiebreaker().is_none());
/// ```
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    backends: HashMap<String, Arc<BackendDescriptor>>,
    order: Vec<String>,
    tiebreaker: Option<String>,
}

impl ProviderRegistry {
    /// Create a new empty ProviderRegistry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from the `[[providers]]` section.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate id or second tiebreaker encountered.
    pub fn from_config(config: &VerdictConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for provider in &config.providers {
            registry.add(BackendDescriptor::from_config(provider, &config.gateway))?;
        }
        Ok(registry)
    }

    /// Add a backend to the registry.
    ///
    /// # Errors
    ///
    /// - `RegistryError::DuplicateBackend` if the id is already registered
    /// - `RegistryError::DuplicateTiebreaker` if a tiebreaker is already registered
    pub fn add(&mut self, descriptor: BackendDescriptor) -> Result<(), RegistryError> {
        let id = descriptor.id.clone();

        if self.backends.contains_key(&id) {
            return Err(RegistryError::DuplicateBackend(id));
        }

        if descriptor.role == ProviderRole::Tiebreaker {
            if let Some(existing) = &self.tiebreaker {
                return Err(RegistryError::DuplicateTiebreaker {
                    existing: existing.clone(),
                    rejected: id,
                });
            }
            self.tiebreaker = Some(id.clone());
        }

        self.order.push(id.clone());
        self.backends.insert(id, Arc::new(descriptor));
        Ok(())
    }

    /// Get a backend by id.
    pub fn get(&self, id: &str) -> Result<Arc<BackendDescriptor>, RegistryError> {
        self.backends
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::BackendNotFound(id.to_string()))
    }

    /// All backends in configuration order.
    pub fn all(&self) -> Vec<Arc<BackendDescriptor>> {
        self.order
            .iter()
            .filter_map(|id| self.backends.get(id).cloned())
            .collect()
    }

    /// Backends with the primary role, in configuration order.
    pub fn primaries(&self) -> Vec<Arc<BackendDescriptor>> {
        self.all()
            .into_iter()
            .filter(|d| d.role == ProviderRole::Primary)
            .collect()
    }

    /// The tiebreaker backend, if one is configured.
    pub fn tiebreaker(&self) -> Option<Arc<BackendDescriptor>> {
        self.tiebreaker
            .as_ref()
            .and_then(|id| self.backends.get(id).cloned())
    }

    /// Get the number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
