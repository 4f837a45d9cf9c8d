//! DDL for the fixed metadata tables and the dynamic index tables.
//!
//! Timestamps are stored as TEXT (ISO 8601 via the dialect formatter).
//! Booleans are INTEGER 0/1. JSON blobs are TEXT. All DDL is idempotent
//! (`IF NOT EXISTS`) so concurrent initialization and allocation are safe.

use crate::adapter::SqlAdapter;
use crate::dialect::Dialect;
use crate::error::{Result, StorageError};
use crate::value::Statement;

/// Fixed-table DDL executed during `init_schema`.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Collections ---------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS collections (
        id                    TEXT PRIMARY KEY,
        name                  TEXT NOT NULL,
        description           TEXT,
        documentsdirectory    TEXT NOT NULL,
        schemaenforcementmode TEXT NOT NULL DEFAULT 'none',
        indexingmode          TEXT NOT NULL DEFAULT 'all',
        labels                TEXT NOT NULL DEFAULT '[]',
        tags                  TEXT NOT NULL DEFAULT '{}',
        createdutc            TEXT NOT NULL,
        lastupdateutc         TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_collections_name ON collections(name)",
    // -- Documents -----------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id            TEXT PRIMARY KEY,
        collectionid  TEXT NOT NULL,
        schemaid      TEXT NOT NULL,
        name          TEXT,
        contentlength INTEGER NOT NULL,
        sha256hash    TEXT NOT NULL,
        createdutc    TEXT NOT NULL,
        lastupdateutc TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_documents_collection ON documents(collectionid)",
    "CREATE INDEX IF NOT EXISTS ix_documents_schema ON documents(schemaid)",
    "CREATE INDEX IF NOT EXISTS ix_documents_created ON documents(createdutc)",
    // -- Schemas -------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS schemas (
        id            TEXT PRIMARY KEY,
        hash          TEXT NOT NULL UNIQUE,
        createdutc    TEXT NOT NULL,
        lastupdateutc TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS schema_elements (
        id       TEXT PRIMARY KEY,
        schemaid TEXT NOT NULL,
        position INTEGER NOT NULL,
        key      TEXT NOT NULL,
        datatype TEXT NOT NULL,
        nullable INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_schema_elements_schema ON schema_elements(schemaid)",
    "CREATE INDEX IF NOT EXISTS ix_schema_elements_key ON schema_elements(key)",
    // -- Labels (set semantics per document) ---------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS labels (
        documentid TEXT NOT NULL,
        labelvalue TEXT NOT NULL,
        PRIMARY KEY (documentid, labelvalue)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_labels_value ON labels(labelvalue)",
    // -- Tags (map semantics per document) -----------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        documentid TEXT NOT NULL,
        tagkey     TEXT NOT NULL,
        tagvalue   TEXT NOT NULL,
        PRIMARY KEY (documentid, tagkey)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_tags_key_value ON tags(tagkey, tagvalue)",
    // -- Field constraints ---------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS field_constraints (
        id               TEXT PRIMARY KEY,
        collectionid     TEXT NOT NULL,
        fieldpath        TEXT NOT NULL,
        datatype         TEXT,
        required         INTEGER NOT NULL DEFAULT 0,
        nullable         INTEGER NOT NULL DEFAULT 1,
        regexpattern     TEXT,
        minvalue         REAL,
        maxvalue         REAL,
        minlength        INTEGER,
        maxlength        INTEGER,
        allowedvalues    TEXT,
        arrayelementtype TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_field_constraints_collection ON field_constraints(collectionid)",
    // -- Indexed fields ------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS indexed_fields (
        id           TEXT PRIMARY KEY,
        collectionid TEXT NOT NULL,
        fieldpath    TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS ix_indexed_fields_unique ON indexed_fields(collectionid, fieldpath)",
    // -- Index table mappings ------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS index_table_mappings (
        key       TEXT PRIMARY KEY,
        tablename TEXT NOT NULL UNIQUE
    )
    "#,
];

/// Creates the fixed tables if they do not exist.
pub fn init_schema(adapter: &dyn SqlAdapter) -> Result<()> {
    for sql in SCHEMA_STATEMENTS {
        adapter.execute(&Statement::bare(*sql)).map_err(|e| {
            StorageError::Backend(format!("schema initialization failed: {e}"))
        })?;
    }
    tracing::debug!("metadata schema initialized");
    Ok(())
}

/// DDL for one dynamic per-leaf index table. Idempotent.
pub fn index_table_statements(dialect: Dialect, table: &str) -> Vec<Statement> {
    let quoted = dialect.quote_ident(table);
    vec![
        Statement::bare(format!(
            "CREATE TABLE IF NOT EXISTS {quoted} (
                id           TEXT PRIMARY KEY,
                documentid   TEXT NOT NULL,
                collectionid TEXT NOT NULL,
                value        TEXT
            )"
        )),
        Statement::bare(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {quoted}(value)",
            dialect.quote_ident(&format!("ix_{table}_value"))
        )),
        Statement::bare(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {quoted}(documentid)",
            dialect.quote_ident(&format!("ix_{table}_document"))
        )),
    ]
}

/// DDL that drops one dynamic index table.
pub fn drop_index_table_statement(dialect: Dialect, table: &str) -> Statement {
    Statement::bare(format!(
        "DROP TABLE IF EXISTS {}",
        dialect.quote_ident(table)
    ))
}
