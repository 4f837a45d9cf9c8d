//! Index-table mapping rows: leaf path -> physical table name.

use lattice_core::indexing::IndexTableMapping;

use crate::adapter::SqlAdapter;
use crate::error::Result;
use crate::value::Statement;

/// Loads the whole mapping table.
pub fn load_all(adapter: &dyn SqlAdapter) -> Result<Vec<IndexTableMapping>> {
    let rows = adapter.query(&Statement::bare(
        "SELECT key, tablename FROM index_table_mappings ORDER BY tablename",
    ))?;
    rows.iter()
        .map(|row| {
            Ok(IndexTableMapping {
                key: row.text("key")?,
                table_name: row.text("tablename")?,
            })
        })
        .collect()
}

/// Records a new allocation. Fails on a duplicate key (the caller serializes
/// allocation, so this signals a logic error rather than a race).
pub fn insert(adapter: &dyn SqlAdapter, key: &str, table_name: &str) -> Result<()> {
    adapter.execute(&Statement::new(
        "INSERT INTO index_table_mappings (key, tablename) VALUES (?, ?)",
        vec![key.into(), table_name.into()],
    ))?;
    Ok(())
}

/// Removes one mapping (rebuild-time reaping).
pub fn delete(adapter: &dyn SqlAdapter, key: &str) -> Result<()> {
    adapter.execute(&Statement::new(
        "DELETE FROM index_table_mappings WHERE key = ?",
        vec![key.into()],
    ))?;
    Ok(())
}

/// The tables a document of the given schema may have rows in: its schema
/// elements joined to the mapping table.
pub fn tables_for_schema(adapter: &dyn SqlAdapter, schema_id: &str) -> Result<Vec<String>> {
    let rows = adapter.query(&Statement::new(
        "SELECT DISTINCT m.tablename AS tablename \
         FROM index_table_mappings m \
         INNER JOIN schema_elements se ON se.key = m.key \
         WHERE se.schemaid = ?",
        vec![schema_id.into()],
    ))?;
    rows.iter().map(|r| r.text("tablename")).collect()
}
