//! Storage error types.

/// Errors that can occur against the relational backend or the blob store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g., "collection", "document").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Failed to establish or maintain a backend connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// A transaction failed to begin, commit, or roll back.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A SQL or DDL statement failed in the backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// A row column was missing or carried an unexpected type.
    #[error("row decode error: {0}")]
    Decode(String),

    /// The operation is not supported by this adapter or build.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A raw SQLite error.
    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blob I/O failed.
    #[error("blob I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the storage crate.
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Creates a [`StorageError::NotFound`] for the given entity kind and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a [`StorageError::Decode`] for a bad column value.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Returns `true` if this is a [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
