//! Schema discovery: resolve a flattened document's fingerprint to a schema
//! row, creating it on first sight.

use chrono::Utc;
use tracing::debug;

use lattice_core::fingerprint::fingerprint;
use lattice_core::flatten::FlattenedDocument;
use lattice_core::ids::{IdKind, new_id};
use lattice_core::schema::{Schema, SchemaElement};
use lattice_storage::repo::schemas;

use crate::error::Result;
use crate::Lattice;

impl Lattice {
    /// Returns the schema id for a document shape, inserting a new schema
    /// row plus its elements when the fingerprint is unseen.
    ///
    /// Concurrent first ingests of the same shape race on the unique `hash`
    /// column; the loser re-resolves by lookup, so exactly one creation
    /// wins.
    pub(crate) fn resolve_schema(&self, flattened: &FlattenedDocument) -> Result<String> {
        let fp = fingerprint(flattened);

        if let Some(id) = schemas::find_id_by_hash(self.adapter.as_ref(), &fp.hash)? {
            return Ok(id);
        }

        let now = Utc::now();
        let schema = Schema {
            id: new_id(IdKind::Schema),
            hash: fp.hash.clone(),
            created_utc: now,
            last_update_utc: now,
        };
        let elements: Vec<SchemaElement> = fp
            .elements
            .iter()
            .enumerate()
            .map(|(position, e)| SchemaElement {
                id: new_id(IdKind::SchemaElement),
                schema_id: schema.id.clone(),
                position: position as i64,
                key: e.key.clone(),
                data_type: e.data_type,
                nullable: e.nullable,
            })
            .collect();

        let stmts = schemas::insert_statements(self.adapter.dialect(), &schema, &elements);
        match self.adapter.execute_transaction(&stmts) {
            Ok(()) => {
                debug!(schema_id = %schema.id, elements = elements.len(), "created schema");
                Ok(schema.id)
            }
            Err(e) => {
                // Lost a creation race: the row must exist now.
                if let Some(existing) = schemas::find_id_by_hash(self.adapter.as_ref(), &fp.hash)? {
                    debug!(schema_id = %existing, "schema created concurrently, reusing");
                    Ok(existing)
                } else {
                    Err(e.into())
                }
            }
        }
    }
}
