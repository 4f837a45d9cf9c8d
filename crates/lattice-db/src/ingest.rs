//! The ingest pipeline and document reads/deletes.

use std::collections::BTreeMap;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use lattice_core::collection::Collection;
use lattice_core::document::Document;
use lattice_core::enums::SchemaEnforcementMode;
use lattice_core::flatten::FlattenedDocument;
use lattice_core::ids::{IdKind, new_id};
use lattice_core::validation;
use lattice_storage::repo::{collections, constraints, documents, indexed_fields, labels, tags};
use lattice_storage::Statement;

use crate::error::{LatticeError, Result};
use crate::{DocumentReadOptions, Lattice};

impl Lattice {
    /// Ingests one JSON document into a collection.
    ///
    /// The pipeline is: parse, flatten, validate (when the collection has
    /// constraints), resolve the schema, persist the blob, then write the
    /// document row, labels, tags, and index rows as one transaction. On a
    /// metadata failure the blob is best-effort deleted.
    pub fn ingest(
        &self,
        collection_id: &str,
        body: &[u8],
        name: Option<&str>,
        doc_labels: &[String],
        doc_tags: &BTreeMap<String, String>,
    ) -> Result<Document> {
        let collection = self.require_collection(collection_id)?;

        // Optional per-collection writer serialization.
        let lock = if self.options.enable_object_locking {
            Some(self.ingest_lock(collection_id)?)
        } else {
            None
        };
        let _guard = match &lock {
            Some(lock) => Some(
                lock.lock()
                    .map_err(|e| lattice_storage::StorageError::Connection(format!(
                        "mutex poisoned: {e}"
                    )))?,
            ),
            None => None,
        };

        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| LatticeError::InvalidJson(e.to_string()))?;
        let flattened = FlattenedDocument::flatten(&value);

        let constraint_rows = constraints::for_collection(self.adapter.as_ref(), collection_id)?;
        if !constraint_rows.is_empty()
            && collection.schema_enforcement_mode != SchemaEnforcementMode::None
        {
            let compiled = validation::compile(constraint_rows)?;
            validation::validate(&flattened, collection.schema_enforcement_mode, &compiled)?;
        }

        let schema_id = self.resolve_schema(&flattened)?;

        let now = Utc::now();
        let doc = Document {
            id: new_id(IdKind::Document),
            collection_id: collection_id.to_owned(),
            schema_id,
            name: name.map(str::to_owned),
            content_length: body.len() as i64,
            sha256_hash: format!("{:x}", Sha256::digest(body)),
            created_utc: now,
            last_update_utc: now,
            labels: doc_labels.to_vec(),
            tags: doc_tags.clone(),
            content: None,
        };

        self.blobs
            .put(&collection.documents_directory, &doc.id, body)?;

        let indexed_paths =
            indexed_fields::paths_for_collection(self.adapter.as_ref(), collection_id)?;
        let batch = self
            .index
            .insert_batch(&collection, &doc.id, &flattened, &indexed_paths)?;

        let mut stmts: Vec<Statement> =
            vec![documents::insert_statement(self.adapter.dialect(), &doc)];
        stmts.extend(labels::insert_statements(&doc.id, doc_labels));
        stmts.extend(tags::insert_statements(&doc.id, doc_tags));
        stmts.extend(batch.statements);

        if let Err(e) = self.adapter.execute_transaction(&stmts) {
            // The blob is outside the transaction; clean it up best-effort.
            if let Err(cleanup) = self
                .blobs
                .delete(&collection.documents_directory, &doc.id)
            {
                warn!(doc_id = %doc.id, error = %cleanup, "orphan blob left after failed ingest");
            }
            return Err(e.into());
        }

        info!(
            doc_id = %doc.id,
            collection_id,
            values_indexed = batch.values_inserted,
            "ingested document"
        );
        Ok(doc)
    }

    /// Fetches a document's metadata, optionally hydrating labels, tags, and
    /// the raw body. Missing documents are `None`, not an error.
    pub fn get_document(
        &self,
        collection_id: &str,
        document_id: &str,
        opts: DocumentReadOptions,
    ) -> Result<Option<Document>> {
        let Some(collection) = collections::get(self.adapter.as_ref(), collection_id)? else {
            return Ok(None);
        };
        let Some(mut doc) =
            documents::get_in_collection(self.adapter.as_ref(), collection_id, document_id)?
        else {
            return Ok(None);
        };

        if opts.include_labels {
            doc.labels = labels::for_document(self.adapter.as_ref(), document_id)?;
        }
        if opts.include_tags {
            doc.tags = tags::for_document(self.adapter.as_ref(), document_id)?;
        }
        if opts.include_content {
            doc.content = self
                .blobs
                .get(&collection.documents_directory, document_id)?
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        }
        Ok(Some(doc))
    }

    /// Whether a document exists in a collection.
    pub fn document_exists(&self, collection_id: &str, document_id: &str) -> Result<bool> {
        Ok(
            documents::get_in_collection(self.adapter.as_ref(), collection_id, document_id)?
                .is_some(),
        )
    }

    /// Deletes one document: its metadata row, labels, tags, and index rows
    /// in one transaction, then its blob. Returns whether it existed.
    pub fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<bool> {
        let Some(collection) = collections::get(self.adapter.as_ref(), collection_id)? else {
            return Ok(false);
        };
        let Some(doc) =
            documents::get_in_collection(self.adapter.as_ref(), collection_id, document_id)?
        else {
            return Ok(false);
        };

        self.delete_document_rows(&collection, &doc)?;
        Ok(true)
    }

    /// Shared delete path used directly and by the collection cascade.
    pub(crate) fn delete_document_rows(
        &self,
        collection: &Collection,
        doc: &Document,
    ) -> Result<()> {
        let mut stmts = vec![
            documents::delete_statement(&doc.id),
            labels::delete_statement(&doc.id),
            tags::delete_statement(&doc.id),
        ];
        stmts.extend(
            self.index
                .delete_statements_for_document(&doc.schema_id, &doc.id)?,
        );
        self.adapter.execute_transaction(&stmts)?;

        if let Err(e) = self.blobs.delete(&collection.documents_directory, &doc.id) {
            // Metadata is already gone; an orphan file is harmless to queries.
            warn!(doc_id = %doc.id, error = %e, "failed to delete document blob");
        }

        info!(doc_id = %doc.id, collection_id = %collection.id, "deleted document");
        Ok(())
    }

    pub(crate) fn require_collection(&self, collection_id: &str) -> Result<Collection> {
        collections::get(self.adapter.as_ref(), collection_id)?
            .ok_or_else(|| LatticeError::CollectionNotFound(collection_id.to_owned()))
    }
}
