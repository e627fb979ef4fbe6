//! Error types for catalog access and the pipeline driver.

use thiserror::Error;

/// Errors produced by catalog access, export and the pipeline driver.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The imagery service failed transiently; the request may be retried.
    #[error("imagery service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("catalog query error: {0}")]
    Query(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("analysis error: {0}")]
    Analysis(#[from] changelens_core::Error),
}

impl CatalogError {
    /// Whether a retry may succeed. Only service unavailability is
    /// transient; malformed queries and analysis failures never are.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
