//! The structured search planner and executor.
//!
//! Each filter compiles to a subquery over its leaf path's index table;
//! label and tag constraints compile to subqueries over their fixed tables.
//! Everything intersects (AND), the total is counted, and one page is
//! hydrated back into [`Document`]s.

use chrono::Utc;

use lattice_core::document::Document;
use lattice_core::query::{
    DEFAULT_MAX_RESULTS, SearchFilter, SearchQuery, SearchResult, TimestampRange,
    records_remaining,
};
use lattice_core::enums::FilterCondition;
use lattice_storage::repo::{documents, labels, tags};
use lattice_storage::{SqlValue, Statement};

use crate::error::{LatticeError, Result};
use crate::Lattice;

/// The compiled form of one filter.
enum FilterPlan {
    /// A document-id subquery clause.
    Clause { sql: String, params: Vec<SqlValue> },
    /// The field has no index table; under AND semantics the whole query
    /// yields zero rows.
    Unsatisfiable,
}

impl Lattice {
    /// Executes a structured search against one collection.
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        let start = Utc::now();
        let collection = self.require_collection(&query.collection_id)?;

        let max_results = query.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let skip = query.skip.unwrap_or(0);
        let ordering = query.ordering.unwrap_or_default();

        let mut clauses: Vec<String> = vec!["collectionid = ?".to_owned()];
        let mut params: Vec<SqlValue> = vec![query.collection_id.as_str().into()];

        for filter in &query.filters {
            match self.plan_filter(filter)? {
                FilterPlan::Clause { sql, params: p } => {
                    clauses.push(sql);
                    params.extend(p);
                }
                FilterPlan::Unsatisfiable => {
                    return Ok(empty_result(start, max_results));
                }
            }
        }

        if !query.labels.is_empty() {
            let placeholders = vec!["?"; query.labels.len()].join(", ");
            clauses.push(format!(
                "id IN (SELECT documentid FROM labels WHERE labelvalue IN ({placeholders}) \
                 GROUP BY documentid HAVING COUNT(DISTINCT labelvalue) = ?)"
            ));
            params.extend(query.labels.iter().map(|l| SqlValue::from(l.as_str())));
            params.push(SqlValue::Integer(query.labels.len() as i64));
        }

        for (key, value) in &query.tags {
            clauses.push(
                "id IN (SELECT documentid FROM tags WHERE tagkey = ? AND tagvalue = ?)".to_owned(),
            );
            params.push(key.as_str().into());
            params.push(value.as_str().into());
        }

        let where_sql = clauses.join(" AND ");

        let count_rows = self.adapter.query(&Statement::new(
            format!("SELECT COUNT(*) AS n FROM documents WHERE {where_sql}"),
            params.clone(),
        ))?;
        let total_records = match count_rows.first() {
            Some(row) => row.integer("n")? as u64,
            None => 0,
        };

        let mut page_params = params;
        page_params.push(SqlValue::Integer(max_results as i64));
        page_params.push(SqlValue::Integer(skip as i64));
        let rows = self.adapter.query(&Statement::new(
            format!(
                "SELECT {} FROM documents WHERE {where_sql} \
                 ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
                documents::DOCUMENT_COLUMNS,
                ordering.column(),
                ordering.direction()
            ),
            page_params,
        ))?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut doc = documents::scan_document(row)?;
            self.hydrate_document(&mut doc, &collection.documents_directory, query.include_content)?;
            docs.push(doc);
        }

        let remaining = records_remaining(total_records, skip, docs.len());
        Ok(SearchResult {
            success: true,
            timestamp: TimestampRange {
                start,
                end: Utc::now(),
            },
            max_results,
            continuation_token: None,
            end_of_results: remaining == 0,
            total_records,
            records_remaining: remaining,
            documents: docs,
        })
    }

    /// Resolves a filter's field to its index table and compiles the value
    /// predicate. Fields with no mapping are unsatisfiable by contract.
    fn plan_filter(&self, filter: &SearchFilter) -> Result<FilterPlan> {
        let Some(table) = self.index.lookup(&filter.field)? else {
            return Ok(FilterPlan::Unsatisfiable);
        };
        let (predicate, params) = compile_predicate(filter)?;
        Ok(FilterPlan::Clause {
            sql: format!(
                "id IN (SELECT documentid FROM {} WHERE {predicate})",
                self.adapter.dialect().quote_ident(&table)
            ),
            params,
        })
    }

    /// Attaches labels, tags, and optionally the raw body to a scanned row.
    pub(crate) fn hydrate_document(
        &self,
        doc: &mut Document,
        documents_directory: &str,
        include_content: bool,
    ) -> Result<()> {
        doc.labels = labels::for_document(self.adapter.as_ref(), &doc.id)?;
        doc.tags = tags::for_document(self.adapter.as_ref(), &doc.id)?;
        if include_content {
            doc.content = self
                .blobs
                .get(documents_directory, &doc.id)?
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        }
        Ok(())
    }
}

/// Compiles one filter's predicate over the index table's `value` column.
fn compile_predicate(filter: &SearchFilter) -> Result<(String, Vec<SqlValue>)> {
    use FilterCondition::*;

    if filter.condition.is_unary() {
        // A JSON null leaf is stored as a row with SQL NULL, so IsNull and
        // IsNotNull are row-presence tests.
        let predicate = match filter.condition {
            IsNull => "value IS NULL",
            _ => "value IS NOT NULL",
        };
        return Ok((predicate.to_owned(), Vec::new()));
    }

    let operand = filter.value.as_deref().ok_or_else(|| {
        LatticeError::InvalidQuery(format!(
            "filter on '{}' ({}) requires a value",
            filter.field, filter.condition
        ))
    })?;

    Ok(match filter.condition {
        Equals => ("value = ?".to_owned(), vec![operand.into()]),
        NotEquals => ("value <> ?".to_owned(), vec![operand.into()]),
        GreaterThan => ordered_predicate(">", operand),
        GreaterThanOrEqualTo => ordered_predicate(">=", operand),
        LessThan => ordered_predicate("<", operand),
        LessThanOrEqualTo => ordered_predicate("<=", operand),
        Contains => like_predicate(format!("%{}%", escape_like(operand))),
        StartsWith => like_predicate(format!("{}%", escape_like(operand))),
        EndsWith => like_predicate(format!("%{}", escape_like(operand))),
        Like => like_predicate(operand.to_owned()),
        IsNull | IsNotNull => unreachable!("unary conditions handled above"),
    })
}

/// Range comparisons cast to numeric when the operand is a number,
/// otherwise compare the encoded text.
fn ordered_predicate(op: &str, operand: &str) -> (String, Vec<SqlValue>) {
    match operand.parse::<f64>() {
        Ok(n) => (
            format!("CAST(value AS REAL) {op} ?"),
            vec![SqlValue::Real(n)],
        ),
        Err(_) => (format!("value {op} ?"), vec![operand.into()]),
    }
}

fn like_predicate(pattern: String) -> (String, Vec<SqlValue>) {
    ("value LIKE ? ESCAPE '\\'".to_owned(), vec![pattern.into()])
}

/// Escapes LIKE wildcards in user text; `\` is the declared escape.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn empty_result(start: chrono::DateTime<Utc>, max_results: u32) -> SearchResult {
    SearchResult {
        success: true,
        timestamp: TimestampRange {
            start,
            end: Utc::now(),
        },
        max_results,
        continuation_token: None,
        end_of_results: true,
        total_records: 0,
        records_remaining: 0,
        documents: Vec::new(),
    }
}
