//! Document metadata rows.

use lattice_core::document::Document;
use lattice_core::enums::DocumentOrdering;

use crate::adapter::SqlAdapter;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::value::{Row, SqlValue, Statement};

/// All document columns in a deterministic order for SELECT queries.
pub const DOCUMENT_COLUMNS: &str =
    "id, collectionid, schemaid, name, contentlength, sha256hash, createdutc, lastupdateutc";

/// Deserializes a row into a [`Document`]. Labels, tags, and content are
/// hydrated separately.
pub fn scan_document(row: &Row) -> Result<Document> {
    Ok(Document {
        id: row.text("id")?,
        collection_id: row.text("collectionid")?,
        schema_id: row.text("schemaid")?,
        name: row.opt_text("name")?,
        content_length: row.integer("contentlength")?,
        sha256_hash: row.text("sha256hash")?,
        created_utc: row.datetime("createdutc")?,
        last_update_utc: row.datetime("lastupdateutc")?,
        labels: Vec::new(),
        tags: Default::default(),
        content: None,
    })
}

/// Builds the INSERT for a document row, for transactional composition.
pub fn insert_statement(dialect: Dialect, doc: &Document) -> Statement {
    Statement::new(
        format!("INSERT INTO documents ({DOCUMENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
        vec![
            doc.id.as_str().into(),
            doc.collection_id.as_str().into(),
            doc.schema_id.as_str().into(),
            doc.name.clone().into(),
            SqlValue::Integer(doc.content_length),
            doc.sha256_hash.as_str().into(),
            dialect.format_timestamp(&doc.created_utc).into(),
            dialect.format_timestamp(&doc.last_update_utc).into(),
        ],
    )
}

/// Fetches a document by id.
pub fn get(adapter: &dyn SqlAdapter, id: &str) -> Result<Option<Document>> {
    let rows = adapter.query(&Statement::new(
        format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"),
        vec![id.into()],
    ))?;
    rows.first().map(scan_document).transpose()
}

/// Fetches a document by id, scoped to a collection.
pub fn get_in_collection(
    adapter: &dyn SqlAdapter,
    collection_id: &str,
    id: &str,
) -> Result<Option<Document>> {
    let rows = adapter.query(&Statement::new(
        format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ? AND collectionid = ?"),
        vec![id.into(), collection_id.into()],
    ))?;
    rows.first().map(scan_document).transpose()
}

/// Statement deleting one document row.
pub fn delete_statement(id: &str) -> Statement {
    Statement::new("DELETE FROM documents WHERE id = ?", vec![id.into()])
}

/// Counts documents, optionally scoped to a collection.
pub fn count(adapter: &dyn SqlAdapter, collection_id: Option<&str>) -> Result<u64> {
    let rows = match collection_id {
        Some(cid) => adapter.query(&Statement::new(
            "SELECT COUNT(*) AS n FROM documents WHERE collectionid = ?",
            vec![cid.into()],
        ))?,
        None => adapter.query(&Statement::bare("SELECT COUNT(*) AS n FROM documents"))?,
    };
    Ok(rows
        .first()
        .map(|r| r.integer("n"))
        .transpose()?
        .unwrap_or(0) as u64)
}

/// Fetches one ordered page of documents, optionally scoped to a collection.
pub fn page(
    adapter: &dyn SqlAdapter,
    collection_id: Option<&str>,
    ordering: DocumentOrdering,
    limit: u32,
    offset: u64,
) -> Result<Vec<Document>> {
    let mut sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents");
    let mut params: Vec<SqlValue> = Vec::new();
    if let Some(cid) = collection_id {
        sql.push_str(" WHERE collectionid = ?");
        params.push(cid.into());
    }
    // id breaks timestamp ties so OFFSET paging stays stable.
    sql.push_str(&format!(
        " ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
        ordering.column(),
        ordering.direction()
    ));
    params.push(SqlValue::Integer(limit as i64));
    params.push(SqlValue::Integer(offset as i64));

    let rows = adapter.query(&Statement::new(sql, params))?;
    rows.iter().map(scan_document).collect()
}

/// Fetches one ascending-`createdutc` chunk of a collection's documents.
/// Used by rebuild and cascade loops to stream without materializing the
/// whole collection.
pub fn chunk_by_created(
    adapter: &dyn SqlAdapter,
    collection_id: &str,
    limit: u32,
    offset: u64,
) -> Result<Vec<Document>> {
    page(
        adapter,
        Some(collection_id),
        DocumentOrdering::CreatedAscending,
        limit,
        offset,
    )
}
