/// Errors that can occur during registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("backend already exists: {0}")]
    DuplicateBackend(String),

    #[error("backend not found: {0}")]
    BackendNotFound(String),

    #[error("tiebreaker already configured: '{existing}' (rejected '{rejected}')")]
    DuplicateTiebreaker { existing: String, rejected: String },
}
