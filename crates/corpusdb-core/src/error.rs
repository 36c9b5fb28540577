use thiserror::Error;

use crate::types::SimilarityMetric;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Index '{name}' exists with dimension {existing_dimension} and metric {existing_metric}, requested dimension {requested_dimension} and metric {requested_metric}")]
    IndexConfigurationConflict {
        name: String,
        existing_dimension: usize,
        existing_metric: SimilarityMetric,
        requested_dimension: usize,
        requested_metric: SimilarityMetric,
    },

    #[error("Index '{name}' not ready after {attempts} readiness checks")]
    IndexProvisioningTimeout { name: String, attempts: usize },

    #[error("Transient embedding failure: {0}")]
    EmbeddingTransient(String),

    #[error("Permanent embedding failure: {0}")]
    EmbeddingPermanent(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Index service unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Index provider failure: {0}")]
    Provider(String),
}

impl Error {
    /// Whether retrying the same call can succeed. Rate limits, timeouts,
    /// and unavailable services are transient; everything else needs a
    /// config or input change first.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::EmbeddingTransient(_) | Error::IndexUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
