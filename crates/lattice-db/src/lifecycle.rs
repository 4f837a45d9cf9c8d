//! Collection lifecycle: create, update policies, delete with cascade.

use chrono::Utc;
use tracing::info;

use lattice_core::collection::{Collection, CreateCollectionOptions};
use lattice_core::constraint::{FieldConstraint, FieldConstraintSpec};
use lattice_core::enums::{IndexingMode, SchemaEnforcementMode};
use lattice_core::ids::{IdKind, new_id};
use lattice_core::query::IndexRebuildResult;
use lattice_core::validation;
use lattice_storage::repo::{collections, constraints, documents, indexed_fields};

use crate::error::Result;
use crate::Lattice;

impl Lattice {
    /// Creates a collection with its initial constraints and indexed fields.
    pub fn create_collection(&self, opts: CreateCollectionOptions) -> Result<Collection> {
        let id = new_id(IdKind::Collection);
        let now = Utc::now();

        let bound: Vec<FieldConstraint> = opts
            .field_constraints
            .into_iter()
            .map(|spec| spec.into_constraint(&id))
            .collect();
        // Reject bad regex patterns before anything persists.
        validation::compile(bound.clone())?;

        let collection = Collection {
            documents_directory: opts.documents_directory.unwrap_or_else(|| id.clone()),
            id,
            name: opts.name,
            description: opts.description,
            labels: opts.labels,
            tags: opts.tags,
            schema_enforcement_mode: opts.schema_enforcement_mode,
            indexing_mode: opts.indexing_mode,
            created_utc: now,
            last_update_utc: now,
        };

        collections::insert(self.adapter.as_ref(), &collection)?;
        if !bound.is_empty() {
            constraints::replace(self.adapter.as_ref(), &collection.id, &bound)?;
        }
        if !opts.indexed_fields.is_empty() {
            indexed_fields::replace(self.adapter.as_ref(), &collection.id, &opts.indexed_fields)?;
        }

        info!(
            collection_id = %collection.id,
            name = %collection.name,
            "created collection"
        );
        Ok(collection)
    }

    /// Fetches a collection. Missing collections are `None`, not an error.
    pub fn get_collection(&self, id: &str) -> Result<Option<Collection>> {
        Ok(collections::get(self.adapter.as_ref(), id)?)
    }

    pub fn list_collections(&self) -> Result<Vec<Collection>> {
        Ok(collections::list(self.adapter.as_ref())?)
    }

    pub fn collection_exists(&self, id: &str) -> Result<bool> {
        Ok(collections::get(self.adapter.as_ref(), id)?.is_some())
    }

    /// Deletes a collection and everything it owns: documents (blobs, label
    /// and tag rows, index rows), constraints, indexed fields, and finally
    /// the collection row. Returns whether the collection existed.
    pub fn delete_collection(&self, id: &str) -> Result<bool> {
        let Some(collection) = collections::get(self.adapter.as_ref(), id)? else {
            return Ok(false);
        };

        // Stream the cascade; each pass re-reads from offset zero because
        // the previous chunk is gone.
        loop {
            let chunk = documents::chunk_by_created(
                self.adapter.as_ref(),
                id,
                self.options.rebuild_chunk_size,
                0,
            )?;
            if chunk.is_empty() {
                break;
            }
            for doc in &chunk {
                self.cancel.check()?;
                self.delete_document_rows(&collection, doc)?;
            }
        }

        self.adapter.execute_transaction(&[
            constraints::delete_all_statement(id),
            indexed_fields::delete_all_statement(id),
            collections::delete_statement(id),
        ])?;

        info!(collection_id = id, "deleted collection");
        Ok(true)
    }

    /// The collection's enforcement mode and constraint set.
    pub fn get_constraints(
        &self,
        collection_id: &str,
    ) -> Result<(SchemaEnforcementMode, Vec<FieldConstraint>)> {
        let collection = self.require_collection(collection_id)?;
        let rows = constraints::for_collection(self.adapter.as_ref(), collection_id)?;
        Ok((collection.schema_enforcement_mode, rows))
    }

    /// Replaces the collection's constraints and enforcement mode.
    pub fn update_constraints(
        &self,
        collection_id: &str,
        mode: SchemaEnforcementMode,
        specs: Vec<FieldConstraintSpec>,
    ) -> Result<()> {
        self.require_collection(collection_id)?;

        let bound: Vec<FieldConstraint> = specs
            .into_iter()
            .map(|spec| spec.into_constraint(collection_id))
            .collect();
        validation::compile(bound.clone())?;

        constraints::replace(self.adapter.as_ref(), collection_id, &bound)?;
        collections::update_enforcement_mode(self.adapter.as_ref(), collection_id, mode)?;
        info!(collection_id, mode = %mode, constraints = bound.len(), "updated constraints");
        Ok(())
    }

    /// The collection's indexing mode and indexed field paths.
    pub fn get_indexing(&self, collection_id: &str) -> Result<(IndexingMode, Vec<String>)> {
        let collection = self.require_collection(collection_id)?;
        let paths = indexed_fields::paths_for_collection(self.adapter.as_ref(), collection_id)?;
        Ok((collection.indexing_mode, paths.into_iter().collect()))
    }

    /// Replaces the collection's indexing policy, optionally rebuilding the
    /// index tables to match.
    pub fn update_indexing(
        &self,
        collection_id: &str,
        mode: IndexingMode,
        fields: Vec<String>,
        rebuild: bool,
    ) -> Result<Option<IndexRebuildResult>> {
        self.require_collection(collection_id)?;

        indexed_fields::replace(self.adapter.as_ref(), collection_id, &fields)?;
        collections::update_indexing_mode(self.adapter.as_ref(), collection_id, mode)?;
        info!(collection_id, mode = %mode, fields = fields.len(), rebuild, "updated indexing");

        if rebuild {
            Ok(Some(self.rebuild_indexes(collection_id, false)?))
        } else {
            Ok(None)
        }
    }
}
