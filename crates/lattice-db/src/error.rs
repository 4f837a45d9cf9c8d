//! Engine error types.

use lattice_core::validation::{ConstraintViolations, InvalidPatternError};
use lattice_storage::StorageError;

/// Errors surfaced by the Lattice engine.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    /// A backend or blob-store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The document was rejected by the constraint validator.
    #[error(transparent)]
    Validation(#[from] ConstraintViolations),

    /// A constraint carried an invalid regex pattern.
    #[error(transparent)]
    InvalidPattern(#[from] InvalidPatternError),

    /// The ingested body was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The referenced collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// A structured query was malformed (e.g. a binary filter without a
    /// value).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A SQL expression fell outside the supported grammar.
    #[error("unsupported SQL: {0}")]
    UnsupportedSql(String),

    /// The operation was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, LatticeError>;

impl LatticeError {
    /// Returns `true` if this error rejects user input rather than
    /// signalling a backend failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidPattern(_)
                | Self::InvalidJson(_)
                | Self::InvalidQuery(_)
                | Self::UnsupportedSql(_)
        )
    }
}
