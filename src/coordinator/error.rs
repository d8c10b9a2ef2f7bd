use crate::decision_log::StoreError;
use thiserror::Error;

/// Fatal pipeline outcomes. Provider failures and safety rejections are data,
/// not errors; only these two conditions abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No primary succeeded and the tiebreaker could not answer either.
    #[error("no provider available: {primaries} primaries failed, tiebreaker {tiebreaker}")]
    NoProviderAvailable {
        primaries: usize,
        /// "failed" or "not configured"
        tiebreaker: &'static str,
    },

    /// The decision was computed but could not be recorded.
    #[error("failed to record decision: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Label used for the `status` dimension of `verdict_queries_total`.
    pub fn metric_label(&self) -> &'static str {
        match self {
            PipelineError::NoProviderAvailable { .. } => "no_provider_available",
            PipelineError::Store(_) => "store_error",
        }
    }
}
