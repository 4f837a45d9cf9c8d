//! Collection rows.

use std::collections::BTreeMap;

use chrono::Utc;

use lattice_core::collection::Collection;
use lattice_core::enums::{IndexingMode, SchemaEnforcementMode};

use crate::adapter::SqlAdapter;
use crate::error::{Result, StorageError};
use crate::value::{Row, Statement};

/// All collection columns in a deterministic order for SELECT queries.
pub const COLLECTION_COLUMNS: &str = "id, name, description, documentsdirectory, \
     schemaenforcementmode, indexingmode, labels, tags, createdutc, lastupdateutc";

/// Deserializes a row into a [`Collection`].
pub fn scan_collection(row: &Row) -> Result<Collection> {
    let enforcement_str = row.text("schemaenforcementmode")?;
    let indexing_str = row.text("indexingmode")?;

    let labels: Vec<String> = serde_json::from_str(&row.text("labels")?)?;
    let tags: BTreeMap<String, String> = serde_json::from_str(&row.text("tags")?)?;

    Ok(Collection {
        id: row.text("id")?,
        name: row.text("name")?,
        description: row.opt_text("description")?,
        documents_directory: row.text("documentsdirectory")?,
        labels,
        tags,
        schema_enforcement_mode: SchemaEnforcementMode::parse(&enforcement_str).ok_or_else(
            || StorageError::decode(format!("bad enforcement mode '{enforcement_str}'")),
        )?,
        indexing_mode: IndexingMode::parse(&indexing_str)
            .ok_or_else(|| StorageError::decode(format!("bad indexing mode '{indexing_str}'")))?,
        created_utc: row.datetime("createdutc")?,
        last_update_utc: row.datetime("lastupdateutc")?,
    })
}

/// Inserts a collection row.
pub fn insert(adapter: &dyn SqlAdapter, collection: &Collection) -> Result<()> {
    let dialect = adapter.dialect();
    adapter.execute(&Statement::new(
        format!(
            "INSERT INTO collections ({COLLECTION_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ),
        vec![
            collection.id.as_str().into(),
            collection.name.as_str().into(),
            collection.description.clone().into(),
            collection.documents_directory.as_str().into(),
            collection.schema_enforcement_mode.as_str().into(),
            collection.indexing_mode.as_str().into(),
            serde_json::to_string(&collection.labels)?.into(),
            serde_json::to_string(&collection.tags)?.into(),
            dialect.format_timestamp(&collection.created_utc).into(),
            dialect.format_timestamp(&collection.last_update_utc).into(),
        ],
    ))?;
    Ok(())
}

/// Fetches a collection by id.
pub fn get(adapter: &dyn SqlAdapter, id: &str) -> Result<Option<Collection>> {
    let rows = adapter.query(&Statement::new(
        format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = ?"),
        vec![id.into()],
    ))?;
    rows.first().map(scan_collection).transpose()
}

/// Lists all collections, oldest first.
pub fn list(adapter: &dyn SqlAdapter) -> Result<Vec<Collection>> {
    let rows = adapter.query(&Statement::bare(format!(
        "SELECT {COLLECTION_COLUMNS} FROM collections ORDER BY createdutc ASC"
    )))?;
    rows.iter().map(scan_collection).collect()
}

/// Bumps a collection's `lastupdateutc`.
pub fn touch(adapter: &dyn SqlAdapter, id: &str) -> Result<()> {
    let now = adapter.dialect().format_timestamp(&Utc::now());
    adapter.execute(&Statement::new(
        "UPDATE collections SET lastupdateutc = ? WHERE id = ?",
        vec![now.into(), id.into()],
    ))?;
    Ok(())
}

/// Updates the enforcement mode and bumps `lastupdateutc`.
pub fn update_enforcement_mode(
    adapter: &dyn SqlAdapter,
    id: &str,
    mode: SchemaEnforcementMode,
) -> Result<()> {
    let now = adapter.dialect().format_timestamp(&Utc::now());
    adapter.execute(&Statement::new(
        "UPDATE collections SET schemaenforcementmode = ?, lastupdateutc = ? WHERE id = ?",
        vec![mode.as_str().into(), now.into(), id.into()],
    ))?;
    Ok(())
}

/// Updates the indexing mode and bumps `lastupdateutc`.
pub fn update_indexing_mode(
    adapter: &dyn SqlAdapter,
    id: &str,
    mode: IndexingMode,
) -> Result<()> {
    let now = adapter.dialect().format_timestamp(&Utc::now());
    adapter.execute(&Statement::new(
        "UPDATE collections SET indexingmode = ?, lastupdateutc = ? WHERE id = ?",
        vec![mode.as_str().into(), now.into(), id.into()],
    ))?;
    Ok(())
}

/// Statement deleting the collection row itself.
pub fn delete_statement(id: &str) -> Statement {
    Statement::new("DELETE FROM collections WHERE id = ?", vec![id.into()])
}
