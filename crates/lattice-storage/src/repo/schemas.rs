//! Schema and schema-element rows. Schemas are global and immutable.

use lattice_core::enums::DataType;
use lattice_core::schema::{Schema, SchemaElement};

use crate::adapter::SqlAdapter;
use crate::dialect::Dialect;
use crate::error::{Result, StorageError};
use crate::value::{Row, SqlValue, Statement};

pub const SCHEMA_COLUMNS: &str = "id, hash, createdutc, lastupdateutc";

pub const ELEMENT_COLUMNS: &str = "id, schemaid, position, key, datatype, nullable";

pub fn scan_schema(row: &Row) -> Result<Schema> {
    Ok(Schema {
        id: row.text("id")?,
        hash: row.text("hash")?,
        created_utc: row.datetime("createdutc")?,
        last_update_utc: row.datetime("lastupdateutc")?,
    })
}

pub fn scan_element(row: &Row) -> Result<SchemaElement> {
    let datatype_str = row.text("datatype")?;
    Ok(SchemaElement {
        id: row.text("id")?,
        schema_id: row.text("schemaid")?,
        position: row.integer("position")?,
        key: row.text("key")?,
        data_type: DataType::parse(&datatype_str)
            .ok_or_else(|| StorageError::decode(format!("bad data type '{datatype_str}'")))?,
        nullable: row.boolean("nullable")?,
    })
}

/// Looks up a schema id by its fingerprint hash.
pub fn find_id_by_hash(adapter: &dyn SqlAdapter, hash: &str) -> Result<Option<String>> {
    let rows = adapter.query(&Statement::new(
        "SELECT id FROM schemas WHERE hash = ?",
        vec![hash.into()],
    ))?;
    rows.first().map(|r| r.text("id")).transpose()
}

/// Statements inserting a schema row plus its elements, for one transaction.
pub fn insert_statements(
    dialect: Dialect,
    schema: &Schema,
    elements: &[SchemaElement],
) -> Vec<Statement> {
    let mut stmts = vec![Statement::new(
        format!("INSERT INTO schemas ({SCHEMA_COLUMNS}) VALUES (?, ?, ?, ?)"),
        vec![
            schema.id.as_str().into(),
            schema.hash.as_str().into(),
            dialect.format_timestamp(&schema.created_utc).into(),
            dialect.format_timestamp(&schema.last_update_utc).into(),
        ],
    )];
    for element in elements {
        stmts.push(Statement::new(
            format!("INSERT INTO schema_elements ({ELEMENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"),
            vec![
                element.id.as_str().into(),
                element.schema_id.as_str().into(),
                SqlValue::Integer(element.position),
                element.key.as_str().into(),
                element.data_type.as_str().into(),
                element.nullable.into(),
            ],
        ));
    }
    stmts
}

pub fn get(adapter: &dyn SqlAdapter, id: &str) -> Result<Option<Schema>> {
    let rows = adapter.query(&Statement::new(
        format!("SELECT {SCHEMA_COLUMNS} FROM schemas WHERE id = ?"),
        vec![id.into()],
    ))?;
    rows.first().map(scan_schema).transpose()
}

pub fn list(adapter: &dyn SqlAdapter) -> Result<Vec<Schema>> {
    let rows = adapter.query(&Statement::bare(format!(
        "SELECT {SCHEMA_COLUMNS} FROM schemas ORDER BY createdutc ASC"
    )))?;
    rows.iter().map(scan_schema).collect()
}

/// A schema's elements, ordered by position.
pub fn elements(adapter: &dyn SqlAdapter, schema_id: &str) -> Result<Vec<SchemaElement>> {
    let rows = adapter.query(&Statement::new(
        format!(
            "SELECT {ELEMENT_COLUMNS} FROM schema_elements \
             WHERE schemaid = ? ORDER BY position ASC"
        ),
        vec![schema_id.into()],
    ))?;
    rows.iter().map(scan_element).collect()
}
