//! Storage layer for the Lattice document database.
//!
//! Provides the [`SqlAdapter`] seam with a SQLite implementation
//! ([`SqliteAdapter`]), the fixed-table DDL, the typed metadata repository,
//! and the [`DocumentBlobStore`] seam with a filesystem implementation.

pub mod adapter;
pub mod blob;
pub mod dialect;
pub mod error;
pub mod repo;
pub mod schema;
pub mod sqlite;
pub mod value;

// Re-exports for convenience.
pub use adapter::SqlAdapter;
pub use blob::{DocumentBlobStore, FsBlobStore};
pub use dialect::Dialect;
pub use error::{Result, StorageError};
pub use sqlite::SqliteAdapter;
pub use value::{Row, SqlValue, Statement};
