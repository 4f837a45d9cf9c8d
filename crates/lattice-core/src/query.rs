//! Search and enumeration query/result types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::enums::{DocumentOrdering, FilterCondition};

/// Page size applied when a query does not set `max_results`.
pub const DEFAULT_MAX_RESULTS: u32 = 100;

/// One predicate over an indexed leaf path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Dotted leaf path.
    pub field: String,

    pub condition: FilterCondition,

    /// Right-hand operand; absent for IsNull / IsNotNull.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl SearchFilter {
    pub fn new(
        field: impl Into<String>,
        condition: FilterCondition,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            condition,
            value: Some(value.into()),
        }
    }

    pub fn unary(field: impl Into<String>, condition: FilterCondition) -> Self {
        Self {
            field: field.into(),
            condition,
            value: None,
        }
    }
}

/// A structured search over one collection. Filters, labels, and tags all
/// intersect (AND semantics).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    pub collection_id: String,

    pub filters: Vec<SearchFilter>,

    /// The document must carry every listed label.
    pub labels: Vec<String>,

    /// The document must carry every listed tag key with the given value.
    pub tags: BTreeMap<String, String>,

    pub max_results: Option<u32>,
    pub skip: Option<u64>,
    pub ordering: Option<DocumentOrdering>,

    pub include_content: bool,
}

impl SearchQuery {
    pub fn for_collection(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            ..Self::default()
        }
    }

    pub fn filter(
        mut self,
        field: impl Into<String>,
        condition: FilterCondition,
        value: impl Into<String>,
    ) -> Self {
        self.filters.push(SearchFilter::new(field, condition, value));
        self
    }

    pub fn unary_filter(mut self, field: impl Into<String>, condition: FilterCondition) -> Self {
        self.filters.push(SearchFilter::unary(field, condition));
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn page(mut self, skip: u64, max_results: u32) -> Self {
        self.skip = Some(skip);
        self.max_results = Some(max_results);
        self
    }

    pub fn ordering(mut self, ordering: DocumentOrdering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    pub fn with_content(mut self) -> Self {
        self.include_content = true;
        self
    }
}

/// A paged scan over documents, optionally scoped to one collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnumerationQuery {
    /// Absent means global enumeration.
    pub collection_id: Option<String>,
    pub skip: Option<u64>,
    pub max_results: Option<u32>,
    pub ordering: Option<DocumentOrdering>,
}

/// Wall-clock bounds of a query execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The search result envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub success: bool,
    pub timestamp: TimestampRange,
    pub max_results: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    pub end_of_results: bool,
    pub total_records: u64,
    pub records_remaining: u64,
    pub documents: Vec<Document>,
}

/// The enumeration result envelope. Same arithmetic as search; the payload
/// field is named `objects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumerationResult {
    pub success: bool,
    pub timestamp: TimestampRange,
    pub max_results: u32,
    pub end_of_results: bool,
    pub total_records: u64,
    pub records_remaining: u64,
    pub objects: Vec<Document>,
}

/// Outcome of a whole-collection index rebuild.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRebuildResult {
    pub documents_processed: u64,
    pub indexes_created: Vec<String>,
    pub indexes_dropped: Vec<String>,
    pub values_inserted: u64,
    pub duration_ms: u64,
    pub errors: Vec<String>,
    pub success: bool,
}

/// Pagination arithmetic shared by search and enumeration:
/// `remaining = max(0, total - skip - returned)`.
pub fn records_remaining(total: u64, skip: u64, returned: usize) -> u64 {
    total.saturating_sub(skip).saturating_sub(returned as u64)
}
