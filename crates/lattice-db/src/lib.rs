//! The embeddable Lattice engine.
//!
//! [`Lattice`] is the facade over a relational backend (via
//! [`SqlAdapter`](lattice_storage::SqlAdapter)) and a blob store. It owns the
//! write pipeline (flatten, validate, schema discovery, index
//! materialization), the search planner, enumeration, and collection
//! lifecycle. Operation implementations live in the sibling modules as
//! `impl Lattice` blocks.

pub mod cancel;
pub mod discovery;
pub mod enumerate;
pub mod error;
pub mod index;
pub mod ingest;
pub mod lifecycle;
pub mod search;
pub mod sqlish;

#[cfg(test)]
mod scenarios;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use lattice_core::indexing::IndexTableMapping;
use lattice_core::schema::{Schema, SchemaElement};
use lattice_storage::repo::{mappings, schemas};
use lattice_storage::{DocumentBlobStore, SqlAdapter, Statement, StorageError, schema};

pub use cancel::CancellationToken;
pub use error::{LatticeError, Result};

use index::IndexEngine;

/// Engine tuning options.
#[derive(Debug, Clone)]
pub struct LatticeOptions {
    /// Serialize ingest per collection behind a mutex, trading throughput
    /// for linearizable ingest ordering within each collection.
    pub enable_object_locking: bool,

    /// How many documents rebuild and cascade loops fetch per chunk.
    pub rebuild_chunk_size: u32,
}

impl Default for LatticeOptions {
    fn default() -> Self {
        Self {
            enable_object_locking: false,
            rebuild_chunk_size: 64,
        }
    }
}

/// Options for a single document read.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentReadOptions {
    pub include_content: bool,
    pub include_labels: bool,
    pub include_tags: bool,
}

impl DocumentReadOptions {
    /// Metadata plus labels and tags, without the body.
    pub fn hydrated() -> Self {
        Self {
            include_content: false,
            include_labels: true,
            include_tags: true,
        }
    }

    /// Everything, body included.
    pub fn full() -> Self {
        Self {
            include_content: true,
            include_labels: true,
            include_tags: true,
        }
    }
}

/// The embeddable document database.
pub struct Lattice {
    pub(crate) adapter: Arc<dyn SqlAdapter>,
    pub(crate) blobs: Arc<dyn DocumentBlobStore>,
    pub(crate) index: IndexEngine,
    pub(crate) options: LatticeOptions,
    pub(crate) cancel: CancellationToken,
    ingest_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Lattice {
    /// Opens the engine over an adapter and blob store, creating the fixed
    /// metadata tables if needed.
    pub fn open(
        adapter: Arc<dyn SqlAdapter>,
        blobs: Arc<dyn DocumentBlobStore>,
        options: LatticeOptions,
    ) -> Result<Self> {
        schema::init_schema(adapter.as_ref())?;
        let index = IndexEngine::new(Arc::clone(&adapter));
        info!(
            object_locking = options.enable_object_locking,
            "lattice engine opened"
        );
        Ok(Self {
            adapter,
            blobs,
            index,
            options,
            cancel: CancellationToken::new(),
            ingest_locks: Mutex::new(HashMap::new()),
        })
    }

    /// The token long-running operations poll. Cancel it to wind down
    /// rebuilds and cascades at the next per-document step.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Backend reachability probe.
    pub fn health(&self) -> Result<()> {
        self.adapter.query(&Statement::bare("SELECT 1"))?;
        Ok(())
    }

    // -- Schema registry -----------------------------------------------------

    /// All discovered schemas, oldest first.
    pub fn list_schemas(&self) -> Result<Vec<Schema>> {
        Ok(schemas::list(self.adapter.as_ref())?)
    }

    pub fn get_schema(&self, id: &str) -> Result<Option<Schema>> {
        Ok(schemas::get(self.adapter.as_ref(), id)?)
    }

    /// A schema's elements ordered by position.
    pub fn get_schema_elements(&self, id: &str) -> Result<Vec<SchemaElement>> {
        Ok(schemas::elements(self.adapter.as_ref(), id)?)
    }

    /// The current index-table mappings.
    pub fn list_index_tables(&self) -> Result<Vec<IndexTableMapping>> {
        Ok(mappings::load_all(self.adapter.as_ref())?)
    }

    // -- Internals -----------------------------------------------------------

    /// The per-collection ingest mutex, created on first use.
    pub(crate) fn ingest_lock(&self, collection_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .ingest_locks
            .lock()
            .map_err(|e| StorageError::Connection(format!("mutex poisoned: {e}")))?;
        Ok(Arc::clone(
            locks
                .entry(collection_id.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }
}

impl std::fmt::Debug for Lattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lattice")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
