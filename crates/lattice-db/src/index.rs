//! The dynamic per-leaf index-table engine.
//!
//! Every indexable leaf path gets its own physical table, allocated on
//! first sight and recorded in `index_table_mappings`. Allocation runs
//! under a process-wide lock so concurrent ingest of a new path sees a
//! single winner; the DDL itself is idempotent.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use lattice_core::collection::Collection;
use lattice_core::enums::IndexingMode;
use lattice_core::flatten::FlattenedDocument;
use lattice_core::ids::{IdKind, decode_base32, encode_base32, new_id};
use lattice_core::query::IndexRebuildResult;
use lattice_storage::repo::{documents, indexed_fields, mappings};
use lattice_storage::{SqlAdapter, SqlValue, Statement, StorageError, schema};

use crate::error::{LatticeError, Result};
use crate::Lattice;

/// Prefix of every dynamic index table. The user path never appears in the
/// identifier; the suffix is a monotonically assigned counter.
const TABLE_PREFIX: &str = "idx_";

#[derive(Default)]
struct MappingState {
    loaded: bool,
    /// path -> table name
    tables: HashMap<String, String>,
    /// Next allocation suffix. Never reused, even after reaping.
    next_suffix: u64,
}

/// Owns index-table allocation and the statement builders for index rows.
pub struct IndexEngine {
    adapter: Arc<dyn SqlAdapter>,
    state: Mutex<MappingState>,
}

/// The index-row statements for one document write.
pub(crate) struct IndexBatch {
    pub statements: Vec<Statement>,
    pub values_inserted: u64,
    pub tables_created: Vec<String>,
}

impl IndexEngine {
    pub fn new(adapter: Arc<dyn SqlAdapter>) -> Self {
        Self {
            adapter,
            state: Mutex::new(MappingState::default()),
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, MappingState>> {
        Ok(self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(format!("mutex poisoned: {e}")))?)
    }

    fn ensure_loaded(&self, state: &mut MappingState) -> Result<()> {
        if state.loaded {
            return Ok(());
        }
        let mut max_suffix = 0u64;
        for mapping in mappings::load_all(self.adapter.as_ref())? {
            if let Some(n) = mapping
                .table_name
                .strip_prefix(TABLE_PREFIX)
                .and_then(decode_base32)
            {
                max_suffix = max_suffix.max(n);
            }
            state.tables.insert(mapping.key, mapping.table_name);
        }
        state.next_suffix = max_suffix + 1;
        state.loaded = true;
        debug!(mappings = state.tables.len(), "index mappings loaded");
        Ok(())
    }

    /// Resolves a path's table without allocating.
    pub fn lookup(&self, path: &str) -> Result<Option<String>> {
        let mut state = self.lock_state()?;
        self.ensure_loaded(&mut state)?;
        Ok(state.tables.get(path).cloned())
    }

    /// Resolves a path's table, allocating it on first sight. Returns the
    /// table name and whether this call created it.
    ///
    /// Lookup, mapping insert, and DDL all run under the engine lock; the
    /// DDL is `IF NOT EXISTS` so a lost cross-process race stays harmless.
    pub fn allocate(&self, path: &str) -> Result<(String, bool)> {
        let mut state = self.lock_state()?;
        self.ensure_loaded(&mut state)?;

        if let Some(table) = state.tables.get(path) {
            return Ok((table.clone(), false));
        }

        let table = format!("{TABLE_PREFIX}{}", encode_base32(state.next_suffix));
        state.next_suffix += 1;

        if let Err(e) = mappings::insert(self.adapter.as_ref(), path, &table) {
            // Another process may have allocated the path first; trust the
            // mapping table over the cache.
            state.loaded = false;
            state.tables.clear();
            self.ensure_loaded(&mut state)?;
            if let Some(existing) = state.tables.get(path) {
                return Ok((existing.clone(), false));
            }
            return Err(e.into());
        }

        for stmt in schema::index_table_statements(self.adapter.dialect(), &table) {
            self.adapter.execute(&stmt)?;
        }

        state.tables.insert(path.to_owned(), table.clone());
        info!(path, table, "allocated index table");
        Ok((table, true))
    }

    /// Builds the index-row INSERTs for one document under the collection's
    /// indexing policy, allocating tables as needed.
    pub(crate) fn insert_batch(
        &self,
        collection: &Collection,
        doc_id: &str,
        flattened: &FlattenedDocument,
        indexed_paths: &BTreeSet<String>,
    ) -> Result<IndexBatch> {
        let mut batch = IndexBatch {
            statements: Vec::new(),
            values_inserted: 0,
            tables_created: Vec::new(),
        };

        if collection.indexing_mode == IndexingMode::None {
            return Ok(batch);
        }

        let dialect = self.adapter.dialect();
        for leaf in &flattened.leaves {
            if collection.indexing_mode == IndexingMode::Selective
                && !indexed_paths.contains(&leaf.path)
            {
                continue;
            }

            let (table, created) = self.allocate(&leaf.path)?;
            if created {
                batch.tables_created.push(table.clone());
            }

            let value: SqlValue = leaf.value.encode().into();
            batch.statements.push(Statement::new(
                format!(
                    "INSERT INTO {} (id, documentid, collectionid, value) VALUES (?, ?, ?, ?)",
                    dialect.quote_ident(&table)
                ),
                vec![
                    new_id(IdKind::IndexValue).into(),
                    doc_id.into(),
                    collection.id.as_str().into(),
                    value,
                ],
            ));
            batch.values_inserted += 1;
        }

        Ok(batch)
    }

    /// DELETEs covering every index table a document of the given schema
    /// could have touched (its schema elements joined to the mappings).
    pub(crate) fn delete_statements_for_document(
        &self,
        schema_id: &str,
        doc_id: &str,
    ) -> Result<Vec<Statement>> {
        let dialect = self.adapter.dialect();
        let tables = mappings::tables_for_schema(self.adapter.as_ref(), schema_id)?;
        Ok(tables
            .iter()
            .map(|table| {
                Statement::new(
                    format!(
                        "DELETE FROM {} WHERE documentid = ?",
                        dialect.quote_ident(table)
                    ),
                    vec![doc_id.into()],
                )
            })
            .collect())
    }

    /// Deletes a collection's rows from every mapped index table.
    pub(crate) fn purge_collection_rows(&self, collection_id: &str) -> Result<()> {
        let dialect = self.adapter.dialect();
        for mapping in mappings::load_all(self.adapter.as_ref())? {
            self.adapter.execute(&Statement::new(
                format!(
                    "DELETE FROM {} WHERE collectionid = ?",
                    dialect.quote_ident(&mapping.table_name)
                ),
                vec![collection_id.into()],
            ))?;
        }
        Ok(())
    }

    /// Total row count of one index table.
    pub(crate) fn table_row_count(&self, table: &str) -> Result<u64> {
        let rows = self.adapter.query(&Statement::bare(format!(
            "SELECT COUNT(*) AS n FROM {}",
            self.adapter.dialect().quote_ident(table)
        )))?;
        Ok(rows
            .first()
            .map(|r| r.integer("n"))
            .transpose()?
            .unwrap_or(0) as u64)
    }

    /// Drops a table and forgets its mapping.
    pub(crate) fn drop_table(&self, key: &str, table: &str) -> Result<()> {
        let mut state = self.lock_state()?;
        self.adapter
            .execute(&schema::drop_index_table_statement(
                self.adapter.dialect(),
                table,
            ))?;
        mappings::delete(self.adapter.as_ref(), key)?;
        state.tables.remove(key);
        info!(key, table, "dropped index table");
        Ok(())
    }
}

impl std::fmt::Debug for IndexEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexEngine").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Whole-collection rebuild
// ---------------------------------------------------------------------------

impl Lattice {
    /// Re-materializes a collection's index rows from blob-store truth.
    ///
    /// Streams the collection ascending `createdutc` in chunks; a
    /// per-document failure is recorded in `errors` without aborting, while
    /// a DDL failure is fatal. With `drop_unused`, index tables left with no
    /// rows that no collection's indexed fields reference are dropped and
    /// their mappings reaped.
    pub fn rebuild_indexes(
        &self,
        collection_id: &str,
        drop_unused: bool,
    ) -> Result<IndexRebuildResult> {
        let started = Instant::now();
        let collection = lattice_storage::repo::collections::get(self.adapter.as_ref(), collection_id)?
            .ok_or_else(|| LatticeError::CollectionNotFound(collection_id.to_owned()))?;

        let indexed_paths = indexed_fields::paths_for_collection(self.adapter.as_ref(), collection_id)?;
        let total_documents = documents::count(self.adapter.as_ref(), Some(collection_id))?;

        info!(
            collection_id,
            total_documents, drop_unused, "index rebuild starting"
        );

        let mut result = IndexRebuildResult::default();

        self.index.purge_collection_rows(collection_id)?;

        let rebuild_chunk_size = self.options.rebuild_chunk_size;
        let mut offset = 0u64;
        loop {
            let chunk = documents::chunk_by_created(
                self.adapter.as_ref(),
                collection_id,
                rebuild_chunk_size,
                offset,
            )?;
            if chunk.is_empty() {
                break;
            }
            offset += chunk.len() as u64;

            for doc in &chunk {
                self.cancel.check()?;
                match self.reindex_document(&collection, &doc.id, &indexed_paths) {
                    Ok(batch_stats) => {
                        result.values_inserted += batch_stats.0;
                        result.indexes_created.extend(batch_stats.1);
                    }
                    Err(e) => {
                        warn!(doc_id = %doc.id, error = %e, "rebuild skipped document");
                        result.errors.push(format!("{}: {e}", doc.id));
                    }
                }
                result.documents_processed += 1;
                if result.documents_processed % 25 == 0 {
                    info!(
                        documents_processed = result.documents_processed,
                        total_documents,
                        values_inserted = result.values_inserted,
                        "index rebuild progress"
                    );
                }
            }
        }

        if drop_unused {
            let referenced = indexed_fields::all_paths(self.adapter.as_ref())?;
            for mapping in mappings::load_all(self.adapter.as_ref())? {
                if referenced.contains(&mapping.key) {
                    continue;
                }
                if self.index.table_row_count(&mapping.table_name)? == 0 {
                    // A DDL failure here is fatal by contract.
                    self.index.drop_table(&mapping.key, &mapping.table_name)?;
                    result.indexes_dropped.push(mapping.table_name);
                }
            }
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        result.success = result.errors.is_empty();
        info!(
            collection_id,
            documents_processed = result.documents_processed,
            values_inserted = result.values_inserted,
            dropped = result.indexes_dropped.len(),
            duration_ms = result.duration_ms,
            "index rebuild finished"
        );
        Ok(result)
    }

    /// Reflattens one document body and inserts its index rows in one
    /// transaction. Returns `(values_inserted, tables_created)`.
    fn reindex_document(
        &self,
        collection: &Collection,
        doc_id: &str,
        indexed_paths: &BTreeSet<String>,
    ) -> Result<(u64, Vec<String>)> {
        let bytes = self
            .blobs
            .get(&collection.documents_directory, doc_id)?
            .ok_or_else(|| StorageError::not_found("document blob", doc_id))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| LatticeError::InvalidJson(e.to_string()))?;
        let flattened = FlattenedDocument::flatten(&value);

        let batch = self
            .index
            .insert_batch(collection, doc_id, &flattened, indexed_paths)?;
        if !batch.statements.is_empty() {
            self.adapter.execute_transaction(&batch.statements)?;
        }
        Ok((batch.values_inserted, batch.tables_created))
    }
}
