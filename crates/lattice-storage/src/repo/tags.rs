//! Per-document tag rows (map semantics; key unique within a document).

use std::collections::BTreeMap;

use crate::adapter::SqlAdapter;
use crate::error::Result;
use crate::value::Statement;

/// Statements attaching tags to a document, for transactional composition.
pub fn insert_statements(document_id: &str, tags: &BTreeMap<String, String>) -> Vec<Statement> {
    tags.iter()
        .map(|(key, value)| {
            Statement::new(
                "INSERT INTO tags (documentid, tagkey, tagvalue) VALUES (?, ?, ?)",
                vec![document_id.into(), key.as_str().into(), value.as_str().into()],
            )
        })
        .collect()
}

/// All tags of one document.
pub fn for_document(
    adapter: &dyn SqlAdapter,
    document_id: &str,
) -> Result<BTreeMap<String, String>> {
    let rows = adapter.query(&Statement::new(
        "SELECT tagkey, tagvalue FROM tags WHERE documentid = ?",
        vec![document_id.into()],
    ))?;
    let mut tags = BTreeMap::new();
    for row in &rows {
        tags.insert(row.text("tagkey")?, row.text("tagvalue")?);
    }
    Ok(tags)
}

/// Statement removing all tags of one document.
pub fn delete_statement(document_id: &str) -> Statement {
    Statement::new(
        "DELETE FROM tags WHERE documentid = ?",
        vec![document_id.into()],
    )
}
