//! The end-to-end scenario suite the harness runs against a live backend.

use std::collections::BTreeMap;

use anyhow::{Context, ensure};
use serde_json::json;

use lattice_core::collection::CreateCollectionOptions;
use lattice_core::constraint::FieldConstraintSpec;
use lattice_core::enums::{DataType, FilterCondition, IndexingMode, SchemaEnforcementMode};
use lattice_core::query::SearchQuery;
use lattice_db::{Lattice, LatticeError};

/// Runs every scenario; the first failure aborts with context.
pub fn run(db: &Lattice) -> anyhow::Result<()> {
    db.health().context("backend unreachable")?;

    let scenarios: &[(&str, fn(&Lattice) -> anyhow::Result<()>)] = &[
        ("schema reuse across shapes", schema_reuse),
        ("nested field search", nested_search),
        ("array membership search", array_membership),
        ("strict mode rejects extras", strict_rejects_extras),
        ("selective indexing", selective_indexing),
        ("rebuild reconciliation", rebuild_reconciliation),
        ("pagination boundaries", pagination_boundaries),
    ];

    for (name, scenario) in scenarios {
        scenario(db).with_context(|| format!("scenario '{name}'"))?;
        println!("[PASS] {name}");
    }
    Ok(())
}

fn ingest(db: &Lattice, collection_id: &str, body: serde_json::Value) -> anyhow::Result<()> {
    db.ingest(
        collection_id,
        body.to_string().as_bytes(),
        None,
        &[],
        &BTreeMap::new(),
    )?;
    Ok(())
}

fn count_hits(
    db: &Lattice,
    collection_id: &str,
    field: &str,
    value: &str,
) -> anyhow::Result<usize> {
    Ok(db
        .search(
            &SearchQuery::for_collection(collection_id).filter(
                field,
                FilterCondition::Equals,
                value,
            ),
        )?
        .documents
        .len())
}

fn schema_reuse(db: &Lattice) -> anyhow::Result<()> {
    let col = db.create_collection(CreateCollectionOptions::new("harness-schemas"))?;

    let a = db.ingest(
        &col.id,
        json!({"Name": "A"}).to_string().as_bytes(),
        None,
        &[],
        &BTreeMap::new(),
    )?;
    let b = db.ingest(
        &col.id,
        json!({"Name": "B"}).to_string().as_bytes(),
        None,
        &[],
        &BTreeMap::new(),
    )?;
    let c = db.ingest(
        &col.id,
        json!({"Age": 30}).to_string().as_bytes(),
        None,
        &[],
        &BTreeMap::new(),
    )?;

    ensure!(a.schema_id == b.schema_id, "identical shapes must share a schema");
    ensure!(a.schema_id != c.schema_id, "distinct shapes must not share a schema");

    db.delete_collection(&col.id)?;
    Ok(())
}

fn nested_search(db: &Lattice) -> anyhow::Result<()> {
    let col = db.create_collection(CreateCollectionOptions::new("harness-nested"))?;
    ingest(db, &col.id, json!({"Person": {"Name": {"First": "Joel"}}}))?;

    ensure!(
        count_hits(db, &col.id, "Person.Name.First", "Joel")? == 1,
        "nested path search must hit"
    );

    db.delete_collection(&col.id)?;
    Ok(())
}

fn array_membership(db: &Lattice) -> anyhow::Result<()> {
    let col = db.create_collection(CreateCollectionOptions::new("harness-arrays"))?;
    ingest(db, &col.id, json!({"Tags": ["red", "green", "blue"]}))?;

    ensure!(count_hits(db, &col.id, "Tags", "green")? == 1, "member must hit");
    ensure!(count_hits(db, &col.id, "Tags", "yellow")? == 0, "non-member must miss");

    db.delete_collection(&col.id)?;
    Ok(())
}

fn strict_rejects_extras(db: &Lattice) -> anyhow::Result<()> {
    let col = db.create_collection(
        CreateCollectionOptions::new("harness-strict")
            .enforcement(SchemaEnforcementMode::Strict)
            .constraint(
                FieldConstraintSpec::new("Name")
                    .data_type(DataType::String)
                    .required(),
            ),
    )?;

    let result = db.ingest(
        &col.id,
        json!({"Name": "Joel", "Extra": "x"}).to_string().as_bytes(),
        None,
        &[],
        &BTreeMap::new(),
    );
    ensure!(
        matches!(result, Err(LatticeError::Validation(_))),
        "strict mode must reject uncovered fields"
    );

    db.delete_collection(&col.id)?;
    Ok(())
}

fn selective_indexing(db: &Lattice) -> anyhow::Result<()> {
    let col = db.create_collection(
        CreateCollectionOptions::new("harness-selective")
            .indexing(IndexingMode::Selective)
            .indexed_field("Name"),
    )?;
    ingest(db, &col.id, json!({"Name": "Joel", "Age": 30}))?;

    ensure!(count_hits(db, &col.id, "Name", "Joel")? == 1, "indexed field must hit");
    ensure!(count_hits(db, &col.id, "Age", "30")? == 0, "unindexed field must miss");

    db.delete_collection(&col.id)?;
    Ok(())
}

fn rebuild_reconciliation(db: &Lattice) -> anyhow::Result<()> {
    let col = db.create_collection(CreateCollectionOptions::new("harness-rebuild"))?;
    for i in 0..10 {
        ingest(db, &col.id, json!({"Name": format!("n{i}"), "Age": i}))?;
    }

    db.update_indexing(&col.id, IndexingMode::Selective, vec!["Name".into()], false)?;
    let result = db.rebuild_indexes(&col.id, true)?;
    ensure!(result.success, "rebuild reported failure: {:?}", result.errors);
    ensure!(result.documents_processed == 10, "all documents must be processed");

    ensure!(count_hits(db, &col.id, "Name", "n3")? == 1, "Name must survive rebuild");
    ensure!(count_hits(db, &col.id, "Age", "3")? == 0, "Age must be gone after rebuild");

    db.delete_collection(&col.id)?;
    Ok(())
}

fn pagination_boundaries(db: &Lattice) -> anyhow::Result<()> {
    let col = db.create_collection(CreateCollectionOptions::new("harness-paging"))?;
    for i in 0..5 {
        ingest(db, &col.id, json!({"N": i}))?;
    }

    let all = db.search(&SearchQuery::for_collection(&col.id).page(0, 100))?;
    ensure!(all.total_records == 5 && all.end_of_results, "max_results > total");

    let past = db.search(&SearchQuery::for_collection(&col.id).page(9, 2))?;
    ensure!(
        past.documents.is_empty() && past.end_of_results && past.records_remaining == 0,
        "skip past the end"
    );

    let mid = db.search(&SearchQuery::for_collection(&col.id).page(1, 2))?;
    ensure!(
        mid.documents.len() == 2 && mid.records_remaining == 2 && !mid.end_of_results,
        "mid-page arithmetic"
    );

    db.delete_collection(&col.id)?;
    Ok(())
}
