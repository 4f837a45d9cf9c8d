//! Indexed-field rows: which leaf paths a Selective collection materializes.

use std::collections::BTreeSet;

use lattice_core::ids::{IdKind, new_id};
use lattice_core::indexing::IndexedField;

use crate::adapter::SqlAdapter;
use crate::error::Result;
use crate::value::Statement;

/// Replaces a collection's indexed fields in one transaction.
pub fn replace(adapter: &dyn SqlAdapter, collection_id: &str, paths: &[String]) -> Result<()> {
    let mut stmts = vec![delete_all_statement(collection_id)];
    for path in paths {
        stmts.push(Statement::new(
            "INSERT INTO indexed_fields (id, collectionid, fieldpath) VALUES (?, ?, ?)",
            vec![
                new_id(IdKind::IndexedField).into(),
                collection_id.into(),
                path.as_str().into(),
            ],
        ));
    }
    adapter.execute_transaction(&stmts)
}

/// The indexed fields of one collection.
pub fn for_collection(adapter: &dyn SqlAdapter, collection_id: &str) -> Result<Vec<IndexedField>> {
    let rows = adapter.query(&Statement::new(
        "SELECT id, collectionid, fieldpath FROM indexed_fields \
         WHERE collectionid = ? ORDER BY fieldpath",
        vec![collection_id.into()],
    ))?;
    rows.iter()
        .map(|row| {
            Ok(IndexedField {
                id: row.text("id")?,
                collection_id: row.text("collectionid")?,
                field_path: row.text("fieldpath")?,
            })
        })
        .collect()
}

/// Just the paths of one collection's indexed fields.
pub fn paths_for_collection(
    adapter: &dyn SqlAdapter,
    collection_id: &str,
) -> Result<BTreeSet<String>> {
    Ok(for_collection(adapter, collection_id)?
        .into_iter()
        .map(|f| f.field_path)
        .collect())
}

/// Every path referenced by any collection's indexed fields. Used by rebuild
/// to decide which empty index tables may be dropped.
pub fn all_paths(adapter: &dyn SqlAdapter) -> Result<BTreeSet<String>> {
    let rows = adapter.query(&Statement::bare(
        "SELECT DISTINCT fieldpath FROM indexed_fields",
    ))?;
    rows.iter().map(|r| r.text("fieldpath")).collect()
}

/// Statement removing all indexed fields of one collection.
pub fn delete_all_statement(collection_id: &str) -> Statement {
    Statement::new(
        "DELETE FROM indexed_fields WHERE collectionid = ?",
        vec![collection_id.into()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteAdapter;

    fn test_adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::open_in_memory().unwrap();
        crate::schema::init_schema(&adapter).unwrap();
        adapter
    }

    #[test]
    fn replace_and_read() {
        let adapter = test_adapter();
        replace(&adapter, "col_1", &["Name".into(), "Age".into()]).unwrap();

        let fields = for_collection(&adapter, "col_1").unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().all(|f| f.id.starts_with("if_")));

        let paths = paths_for_collection(&adapter, "col_1").unwrap();
        assert!(paths.contains("Name") && paths.contains("Age"));
    }

    #[test]
    fn replace_is_destructive() {
        let adapter = test_adapter();
        replace(&adapter, "col_1", &["Old".into()]).unwrap();
        replace(&adapter, "col_1", &["New".into()]).unwrap();

        let paths = paths_for_collection(&adapter, "col_1").unwrap();
        assert_eq!(paths.into_iter().collect::<Vec<_>>(), vec!["New"]);
    }

    #[test]
    fn all_paths_spans_collections() {
        let adapter = test_adapter();
        replace(&adapter, "col_1", &["A".into()]).unwrap();
        replace(&adapter, "col_2", &["A".into(), "B".into()]).unwrap();

        let paths = all_paths(&adapter).unwrap();
        assert_eq!(paths.len(), 2);
    }
}
