//! End-to-end engine tests over in-memory SQLite and a temp-dir blob store.

use std::collections::BTreeMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use lattice_core::collection::CreateCollectionOptions;
use lattice_core::constraint::FieldConstraintSpec;
use lattice_core::document::Document;
use lattice_core::enums::{
    DataType, DocumentOrdering, FilterCondition, IndexingMode, SchemaEnforcementMode,
};
use lattice_core::query::{EnumerationQuery, SearchQuery};
use lattice_core::validation::ErrorCode;
use lattice_storage::{DocumentBlobStore, FsBlobStore, SqlAdapter, SqliteAdapter, Statement};

use crate::{DocumentReadOptions, Lattice, LatticeError, LatticeOptions};

fn test_db_with(options: LatticeOptions) -> (tempfile::TempDir, Lattice) {
    let dir = tempfile::tempdir().unwrap();
    let adapter: Arc<dyn SqlAdapter> = Arc::new(SqliteAdapter::open_in_memory().unwrap());
    let blobs: Arc<dyn DocumentBlobStore> = Arc::new(FsBlobStore::new(dir.path()));
    let db = Lattice::open(adapter, blobs, options).unwrap();
    (dir, db)
}

fn test_db() -> (tempfile::TempDir, Lattice) {
    test_db_with(LatticeOptions::default())
}

fn ingest(db: &Lattice, collection_id: &str, body: serde_json::Value) -> Document {
    db.ingest(
        collection_id,
        body.to_string().as_bytes(),
        None,
        &[],
        &BTreeMap::new(),
    )
    .unwrap()
}

fn search_field(db: &Lattice, collection_id: &str, field: &str, value: &str) -> Vec<Document> {
    db.search(
        &SearchQuery::for_collection(collection_id).filter(field, FilterCondition::Equals, value),
    )
    .unwrap()
    .documents
}

fn index_rows(db: &Lattice, path: &str) -> i64 {
    let Some(table) = db.index.lookup(path).unwrap() else {
        return 0;
    };
    let rows = db
        .adapter
        .query(&Statement::bare(format!(
            "SELECT COUNT(*) AS n FROM {}",
            db.adapter.dialect().quote_ident(&table)
        )))
        .unwrap();
    rows[0].integer("n").unwrap()
}

fn count_table(db: &Lattice, table: &str) -> i64 {
    let rows = db
        .adapter
        .query(&Statement::bare(format!("SELECT COUNT(*) AS n FROM {table}")))
        .unwrap();
    rows[0].integer("n").unwrap()
}

// ---------------------------------------------------------------------------
// Schema discovery
// ---------------------------------------------------------------------------

#[test]
fn schema_reuse_across_identical_shapes() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("people"))
        .unwrap();

    let a = ingest(&db, &col.id, json!({"Name": "A"}));
    let b = ingest(&db, &col.id, json!({"Name": "B"}));
    assert_eq!(a.schema_id, b.schema_id);

    let c = ingest(&db, &col.id, json!({"Age": 30}));
    assert_ne!(a.schema_id, c.schema_id);

    assert_eq!(db.list_schemas().unwrap().len(), 2);
}

#[test]
fn schemas_are_shared_across_collections() {
    let (_dir, db) = test_db();
    let col1 = db
        .create_collection(CreateCollectionOptions::new("one"))
        .unwrap();
    let col2 = db
        .create_collection(CreateCollectionOptions::new("two"))
        .unwrap();

    let a = ingest(&db, &col1.id, json!({"Sku": "x", "Qty": 2}));
    let b = ingest(&db, &col2.id, json!({"Sku": "y", "Qty": 9}));
    assert_eq!(a.schema_id, b.schema_id);
}

#[test]
fn schema_elements_enumerate_leaves_in_order() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let doc = ingest(
        &db,
        &col.id,
        json!({"Name": "x", "Age": 30, "Person": {"City": "Oslo"}}),
    );

    let elements = db.get_schema_elements(&doc.schema_id).unwrap();
    let keys: Vec<&str> = elements.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["Name", "Age", "Person.City"]);
    assert_eq!(elements[0].position, 0);
    assert_eq!(elements[1].data_type, DataType::Integer);
    assert!(db.get_schema(&doc.schema_id).unwrap().is_some());
    assert!(db.get_schema("sch_missing").unwrap().is_none());
}

#[test]
fn empty_object_still_produces_document_and_schema() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let doc = ingest(&db, &col.id, json!({}));

    assert!(db.get_schema(&doc.schema_id).unwrap().is_some());
    assert!(db.get_schema_elements(&doc.schema_id).unwrap().is_empty());
    assert!(db.document_exists(&col.id, &doc.id).unwrap());
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn nested_field_search() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let doc = ingest(&db, &col.id, json!({"Person": {"Name": {"First": "Joel"}}}));
    ingest(&db, &col.id, json!({"Person": {"Name": {"First": "Maria"}}}));

    let hits = search_field(&db, &col.id, "Person.Name.First", "Joel");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, doc.id);
}

#[test]
fn array_membership_search() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let doc = ingest(&db, &col.id, json!({"Tags": ["red", "green", "blue"]}));

    let hits = search_field(&db, &col.id, "Tags", "green");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, doc.id);

    assert!(search_field(&db, &col.id, "Tags", "yellow").is_empty());
}

#[test]
fn unmapped_field_is_unsatisfiable() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    ingest(&db, &col.id, json!({"Name": "x"}));

    let result = db
        .search(
            &SearchQuery::for_collection(&col.id)
                .filter("NeverSeen", FilterCondition::Equals, "x")
                .filter("Name", FilterCondition::Equals, "x"),
        )
        .unwrap();
    assert_eq!(result.total_records, 0);
    assert!(result.documents.is_empty());
    assert!(result.end_of_results);
}

#[test]
fn range_and_string_conditions() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    ingest(&db, &col.id, json!({"Name": "Joel", "Age": 47}));
    ingest(&db, &col.id, json!({"Name": "Maria", "Age": 9}));

    let q = |field: &str, cond, value: &str| {
        db.search(&SearchQuery::for_collection(&col.id).filter(field, cond, value))
            .unwrap()
            .documents
            .len()
    };

    assert_eq!(q("Age", FilterCondition::GreaterThan, "21"), 1);
    assert_eq!(q("Age", FilterCondition::GreaterThanOrEqualTo, "9"), 2);
    assert_eq!(q("Age", FilterCondition::LessThan, "9"), 0);
    assert_eq!(q("Age", FilterCondition::LessThanOrEqualTo, "9"), 1);
    assert_eq!(q("Name", FilterCondition::NotEquals, "Joel"), 1);
    assert_eq!(q("Name", FilterCondition::Contains, "ar"), 1);
    assert_eq!(q("Name", FilterCondition::StartsWith, "Jo"), 1);
    assert_eq!(q("Name", FilterCondition::EndsWith, "ia"), 1);
    assert_eq!(q("Name", FilterCondition::Like, "%o%"), 1);
}

#[test]
fn like_wildcards_in_user_text_are_literal_for_contains() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    ingest(&db, &col.id, json!({"Note": "50% done"}));
    ingest(&db, &col.id, json!({"Note": "500 done"}));

    let hits = db
        .search(
            &SearchQuery::for_collection(&col.id).filter(
                "Note",
                FilterCondition::Contains,
                "50%",
            ),
        )
        .unwrap()
        .documents;
    assert_eq!(hits.len(), 1);
}

#[test]
fn null_leaves_support_row_presence_isnull() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let with_null = ingest(&db, &col.id, json!({"A": null, "B": 1}));
    ingest(&db, &col.id, json!({"B": 2}));

    let is_null = db
        .search(&SearchQuery::for_collection(&col.id).unary_filter("A", FilterCondition::IsNull))
        .unwrap()
        .documents;
    assert_eq!(is_null.len(), 1);
    assert_eq!(is_null[0].id, with_null.id);

    // A JSON null row is present but NULL-valued, so IsNotNull excludes it;
    // the document without the field has no row at all.
    let not_null = db
        .search(
            &SearchQuery::for_collection(&col.id).unary_filter("A", FilterCondition::IsNotNull),
        )
        .unwrap()
        .documents;
    assert!(not_null.is_empty());

    let b_not_null = db
        .search(
            &SearchQuery::for_collection(&col.id).unary_filter("B", FilterCondition::IsNotNull),
        )
        .unwrap()
        .documents;
    assert_eq!(b_not_null.len(), 2);
}

#[test]
fn labels_and_tags_intersect() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();

    let tags_eu = BTreeMap::from([("env".to_string(), "eu".to_string())]);
    let both = db
        .ingest(
            &col.id,
            json!({"Name": "x"}).to_string().as_bytes(),
            None,
            &["alpha".into(), "beta".into()],
            &tags_eu,
        )
        .unwrap();
    db.ingest(
        &col.id,
        json!({"Name": "y"}).to_string().as_bytes(),
        None,
        &["alpha".into()],
        &BTreeMap::new(),
    )
    .unwrap();

    let by_labels = db
        .search(
            &SearchQuery::for_collection(&col.id)
                .label("alpha")
                .label("beta"),
        )
        .unwrap()
        .documents;
    assert_eq!(by_labels.len(), 1);
    assert_eq!(by_labels[0].id, both.id);
    assert_eq!(by_labels[0].labels, vec!["alpha", "beta"]);

    let by_tag = db
        .search(&SearchQuery::for_collection(&col.id).tag("env", "eu"))
        .unwrap()
        .documents;
    assert_eq!(by_tag.len(), 1);

    let no_match = db
        .search(&SearchQuery::for_collection(&col.id).tag("env", "us"))
        .unwrap()
        .documents;
    assert!(no_match.is_empty());
}

#[test]
fn search_pagination_arithmetic() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    for i in 0..5 {
        ingest(&db, &col.id, json!({"N": i}));
    }

    let all = db
        .search(&SearchQuery::for_collection(&col.id).page(0, 100))
        .unwrap();
    assert_eq!(all.total_records, 5);
    assert_eq!(all.documents.len(), 5);
    assert_eq!(all.records_remaining, 0);
    assert!(all.end_of_results);

    let first_two = db
        .search(&SearchQuery::for_collection(&col.id).page(0, 2))
        .unwrap();
    assert_eq!(first_two.documents.len(), 2);
    assert_eq!(first_two.records_remaining, 3);
    assert!(!first_two.end_of_results);

    let past_end = db
        .search(&SearchQuery::for_collection(&col.id).page(10, 2))
        .unwrap();
    assert!(past_end.documents.is_empty());
    assert_eq!(past_end.total_records, 5);
    assert_eq!(past_end.records_remaining, 0);
    assert!(past_end.end_of_results);
}

#[test]
fn search_ordering_by_name() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    for name in ["bravo", "alpha", "charlie"] {
        db.ingest(
            &col.id,
            json!({"X": 1}).to_string().as_bytes(),
            Some(name),
            &[],
            &BTreeMap::new(),
        )
        .unwrap();
    }

    let result = db
        .search(&SearchQuery::for_collection(&col.id).ordering(DocumentOrdering::NameAscending))
        .unwrap();
    let names: Vec<&str> = result
        .documents
        .iter()
        .filter_map(|d| d.name.as_deref())
        .collect();
    assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
}

#[test]
fn include_content_attaches_raw_body() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let body = json!({"Name": "Joel"}).to_string();
    db.ingest(&col.id, body.as_bytes(), None, &[], &BTreeMap::new())
        .unwrap();

    let hits = db
        .search(
            &SearchQuery::for_collection(&col.id)
                .filter("Name", FilterCondition::Equals, "Joel")
                .with_content(),
        )
        .unwrap()
        .documents;
    assert_eq!(hits[0].content.as_deref(), Some(body.as_str()));
}

// ---------------------------------------------------------------------------
// SQL-like search
// ---------------------------------------------------------------------------

#[test]
fn sql_expression_search() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    ingest(&db, &col.id, json!({"Name": "Joel", "Age": 47}));
    ingest(&db, &col.id, json!({"Name": "Maria", "Age": 9}));

    let hits = db
        .search_by_sql(&col.id, "SELECT * FROM documents WHERE Name = 'Joel'")
        .unwrap();
    assert_eq!(hits.documents.len(), 1);

    let grown = db
        .search_by_sql(
            &col.id,
            "SELECT * FROM documents WHERE Age >= 18 AND Name LIKE 'J%' LIMIT 10",
        )
        .unwrap();
    assert_eq!(grown.documents.len(), 1);

    let err = db
        .search_by_sql(&col.id, "SELECT * FROM documents WHERE A = 1 OR B = 2")
        .unwrap_err();
    assert!(matches!(err, LatticeError::UnsupportedSql(_)));
}

// ---------------------------------------------------------------------------
// Validation at ingest
// ---------------------------------------------------------------------------

#[test]
fn strict_mode_rejects_extras() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(
            CreateCollectionOptions::new("c")
                .enforcement(SchemaEnforcementMode::Strict)
                .constraint(
                    FieldConstraintSpec::new("Name")
                        .data_type(DataType::String)
                        .required(),
                ),
        )
        .unwrap();

    let err = db
        .ingest(
            &col.id,
            json!({"Name": "Joel", "Extra": "x"}).to_string().as_bytes(),
            None,
            &[],
            &BTreeMap::new(),
        )
        .unwrap_err();

    match err {
        LatticeError::Validation(v) => {
            assert_eq!(v.errors.len(), 1);
            assert_eq!(v.errors[0].error_code, ErrorCode::UnexpectedField);
            assert_eq!(v.errors[0].field_path, "Extra");
        }
        other => panic!("expected Validation, got {other:?}"),
    }

    // Nothing persisted for the rejected document.
    assert_eq!(count_table(&db, "documents"), 0);
}

#[test]
fn validation_skipped_when_mode_is_none() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(
            CreateCollectionOptions::new("c")
                .constraint(FieldConstraintSpec::new("Name").required()),
        )
        .unwrap();
    // Mode defaults to None, so the required constraint is not enforced.
    ingest(&db, &col.id, json!({"Other": 1}));
}

#[test]
fn update_constraints_rejects_bad_regex() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let err = db
        .update_constraints(
            &col.id,
            SchemaEnforcementMode::Flexible,
            vec![FieldConstraintSpec::new("X").pattern("(")],
        )
        .unwrap_err();
    assert!(matches!(err, LatticeError::InvalidPattern(_)));
}

#[test]
fn constraints_round_trip_through_update() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();

    db.update_constraints(
        &col.id,
        SchemaEnforcementMode::Flexible,
        vec![
            FieldConstraintSpec::new("Age")
                .data_type(DataType::Integer)
                .min_value(0.0),
        ],
    )
    .unwrap();

    let (mode, rows) = db.get_constraints(&col.id).unwrap();
    assert_eq!(mode, SchemaEnforcementMode::Flexible);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].field_path, "Age");

    let err = db
        .ingest(
            &col.id,
            json!({"Age": -1}).to_string().as_bytes(),
            None,
            &[],
            &BTreeMap::new(),
        )
        .unwrap_err();
    assert!(matches!(err, LatticeError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Indexing policy and rebuild
// ---------------------------------------------------------------------------

#[test]
fn selective_indexing_materializes_only_selected_paths() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(
            CreateCollectionOptions::new("c")
                .indexing(IndexingMode::Selective)
                .indexed_field("Name"),
        )
        .unwrap();
    ingest(&db, &col.id, json!({"Name": "Joel", "Age": 30}));

    assert_eq!(search_field(&db, &col.id, "Name", "Joel").len(), 1);
    assert!(search_field(&db, &col.id, "Age", "30").is_empty());
}

#[test]
fn indexing_mode_none_indexes_nothing() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c").indexing(IndexingMode::None))
        .unwrap();
    ingest(&db, &col.id, json!({"Name": "Joel"}));

    assert!(search_field(&db, &col.id, "Name", "Joel").is_empty());
    assert!(db.list_index_tables().unwrap().is_empty());
}

#[test]
fn index_invariant_one_row_per_leaf() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    ingest(&db, &col.id, json!({"Name": "a", "Tags": ["x", "y"]}));
    ingest(&db, &col.id, json!({"Name": "b", "Tags": ["z"]}));

    assert_eq!(index_rows(&db, "Name"), 2);
    assert_eq!(index_rows(&db, "Tags"), 3);
}

#[test]
fn rebuild_reconciles_policy_switch() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    for i in 0..10 {
        ingest(&db, &col.id, json!({"Name": format!("n{i}"), "Age": i}));
    }
    assert_eq!(index_rows(&db, "Age"), 10);

    db.update_indexing(&col.id, IndexingMode::Selective, vec!["Name".into()], false)
        .unwrap();
    let result = db.rebuild_indexes(&col.id, true).unwrap();
    assert!(result.success);
    assert_eq!(result.documents_processed, 10);
    assert_eq!(result.values_inserted, 10); // Name rows only

    // The Age table lost this collection's rows and, being empty and
    // unreferenced, was dropped with its mapping.
    assert!(db.index.lookup("Age").unwrap().is_none());
    assert!(!result.indexes_dropped.is_empty());

    assert_eq!(search_field(&db, &col.id, "Name", "n3").len(), 1);
    assert!(search_field(&db, &col.id, "Age", "3").is_empty());
}

#[test]
fn rebuild_is_idempotent() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    for i in 0..7 {
        ingest(&db, &col.id, json!({"Name": format!("n{i}")}));
    }

    db.rebuild_indexes(&col.id, false).unwrap();
    let after_first = index_rows(&db, "Name");
    db.rebuild_indexes(&col.id, false).unwrap();
    let after_second = index_rows(&db, "Name");

    assert_eq!(after_first, 7);
    assert_eq!(after_first, after_second);
}

#[test]
fn rebuild_of_missing_collection_fails() {
    let (_dir, db) = test_db();
    assert!(matches!(
        db.rebuild_indexes("col_missing", false),
        Err(LatticeError::CollectionNotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Document reads and deletes
// ---------------------------------------------------------------------------

#[test]
fn get_document_hydration_options() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let body = json!({"Name": "x"}).to_string();
    let tags = BTreeMap::from([("env".to_string(), "eu".to_string())]);
    let doc = db
        .ingest(&col.id, body.as_bytes(), Some("named"), &["l1".into()], &tags)
        .unwrap();

    let bare = db
        .get_document(&col.id, &doc.id, DocumentReadOptions::default())
        .unwrap()
        .unwrap();
    assert!(bare.labels.is_empty());
    assert!(bare.content.is_none());
    assert_eq!(bare.name.as_deref(), Some("named"));
    assert_eq!(bare.content_length, body.len() as i64);

    let full = db
        .get_document(&col.id, &doc.id, DocumentReadOptions::full())
        .unwrap()
        .unwrap();
    assert_eq!(full.labels, vec!["l1"]);
    assert_eq!(full.tags, tags);
    assert_eq!(full.content.as_deref(), Some(body.as_str()));

    assert!(
        db.get_document(&col.id, "doc_missing", DocumentReadOptions::default())
            .unwrap()
            .is_none()
    );
}

#[test]
fn sha256_covers_original_bytes() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let body = br#"{"Name":"Joel"}"#;
    let doc = db
        .ingest(&col.id, body, None, &[], &BTreeMap::new())
        .unwrap();

    use sha2::{Digest, Sha256};
    assert_eq!(doc.sha256_hash, format!("{:x}", Sha256::digest(body)));
    assert_eq!(doc.content_length, body.len() as i64);
}

#[test]
fn delete_document_cleans_every_trace() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let doc = db
        .ingest(
            &col.id,
            json!({"Name": "x", "Tags": ["a"]}).to_string().as_bytes(),
            None,
            &["l".into()],
            &BTreeMap::from([("k".to_string(), "v".to_string())]),
        )
        .unwrap();

    assert!(db.delete_document(&col.id, &doc.id).unwrap());
    assert!(!db.delete_document(&col.id, &doc.id).unwrap());

    assert_eq!(count_table(&db, "documents"), 0);
    assert_eq!(count_table(&db, "labels"), 0);
    assert_eq!(count_table(&db, "tags"), 0);
    assert_eq!(index_rows(&db, "Name"), 0);
    assert_eq!(index_rows(&db, "Tags"), 0);
    assert!(search_field(&db, &col.id, "Name", "x").is_empty());
}

#[test]
fn invalid_json_is_rejected() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    let err = db
        .ingest(&col.id, b"{not json", None, &[], &BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, LatticeError::InvalidJson(_)));
}

#[test]
fn ingest_into_missing_collection_fails() {
    let (_dir, db) = test_db();
    let err = db
        .ingest("col_missing", b"{}", None, &[], &BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, LatticeError::CollectionNotFound(_)));
}

// ---------------------------------------------------------------------------
// Collection lifecycle
// ---------------------------------------------------------------------------

#[test]
fn delete_collection_cascades() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(
            CreateCollectionOptions::new("c")
                .constraint(FieldConstraintSpec::new("Name"))
                .indexed_field("Name"),
        )
        .unwrap();
    for i in 0..5 {
        db.ingest(
            &col.id,
            json!({"Name": format!("n{i}")}).to_string().as_bytes(),
            None,
            &["l".into()],
            &BTreeMap::from([("k".to_string(), "v".to_string())]),
        )
        .unwrap();
    }

    assert!(db.delete_collection(&col.id).unwrap());
    assert!(!db.delete_collection(&col.id).unwrap());

    for table in [
        "documents",
        "labels",
        "tags",
        "field_constraints",
        "indexed_fields",
    ] {
        assert_eq!(count_table(&db, table), 0, "residue in {table}");
    }
    assert_eq!(index_rows(&db, "Name"), 0);
    assert!(db.get_collection(&col.id).unwrap().is_none());
}

#[test]
fn collection_listing_and_existence() {
    let (_dir, db) = test_db();
    assert!(db.list_collections().unwrap().is_empty());
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    assert!(db.collection_exists(&col.id).unwrap());
    assert!(!db.collection_exists("col_missing").unwrap());
    assert_eq!(db.list_collections().unwrap().len(), 1);
}

#[test]
fn cancelled_token_aborts_cascade() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    ingest(&db, &col.id, json!({"Name": "x"}));

    db.cancel_token().cancel();
    assert!(matches!(
        db.delete_collection(&col.id),
        Err(LatticeError::Cancelled)
    ));
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

#[test]
fn enumeration_scoped_and_global() {
    let (_dir, db) = test_db();
    let col1 = db
        .create_collection(CreateCollectionOptions::new("one"))
        .unwrap();
    let col2 = db
        .create_collection(CreateCollectionOptions::new("two"))
        .unwrap();
    for i in 0..3 {
        ingest(&db, &col1.id, json!({"N": i}));
    }
    ingest(&db, &col2.id, json!({"N": 99}));

    let global = db.enumerate(&EnumerationQuery::default()).unwrap();
    assert_eq!(global.total_records, 4);
    assert_eq!(global.objects.len(), 4);
    assert!(global.end_of_results);

    let scoped = db
        .enumerate(&EnumerationQuery {
            collection_id: Some(col1.id.clone()),
            skip: Some(1),
            max_results: Some(1),
            ordering: Some(DocumentOrdering::CreatedAscending),
        })
        .unwrap();
    assert_eq!(scoped.total_records, 3);
    assert_eq!(scoped.objects.len(), 1);
    assert_eq!(scoped.records_remaining, 1);
    assert!(!scoped.end_of_results);
}

// ---------------------------------------------------------------------------
// Engine plumbing
// ---------------------------------------------------------------------------

#[test]
fn health_probe() {
    let (_dir, db) = test_db();
    db.health().unwrap();
}

#[test]
fn object_locking_smoke() {
    let (_dir, db) = test_db_with(LatticeOptions {
        enable_object_locking: true,
        ..LatticeOptions::default()
    });
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    ingest(&db, &col.id, json!({"Name": "x"}));
    assert_eq!(search_field(&db, &col.id, "Name", "x").len(), 1);
}

#[test]
fn index_tables_listing() {
    let (_dir, db) = test_db();
    let col = db
        .create_collection(CreateCollectionOptions::new("c"))
        .unwrap();
    ingest(&db, &col.id, json!({"Name": "x", "Age": 1}));

    let mappings = db.list_index_tables().unwrap();
    assert_eq!(mappings.len(), 2);
    assert!(mappings.iter().all(|m| m.table_name.starts_with("idx_")));
    assert!(mappings.iter().any(|m| m.key == "Name"));
}
