//! Per-document label rows (set semantics).

use std::collections::BTreeSet;

use crate::adapter::SqlAdapter;
use crate::error::Result;
use crate::value::Statement;

/// Statements attaching labels to a document, for transactional composition.
/// Duplicate inputs collapse (labels are a set).
pub fn insert_statements(document_id: &str, labels: &[String]) -> Vec<Statement> {
    let unique: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
    unique
        .into_iter()
        .map(|label| {
            Statement::new(
                "INSERT INTO labels (documentid, labelvalue) VALUES (?, ?)",
                vec![document_id.into(), label.into()],
            )
        })
        .collect()
}

/// All labels of one document, sorted.
pub fn for_document(adapter: &dyn SqlAdapter, document_id: &str) -> Result<Vec<String>> {
    let rows = adapter.query(&Statement::new(
        "SELECT labelvalue FROM labels WHERE documentid = ? ORDER BY labelvalue",
        vec![document_id.into()],
    ))?;
    rows.iter().map(|r| r.text("labelvalue")).collect()
}

/// Statement removing all labels of one document.
pub fn delete_statement(document_id: &str) -> Statement {
    Statement::new(
        "DELETE FROM labels WHERE documentid = ?",
        vec![document_id.into()],
    )
}
