//! Indexing metadata entities.

use serde::{Deserialize, Serialize};

/// A leaf path selected for materialization when a collection's indexing
/// mode is `Selective`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedField {
    pub id: String,
    pub collection_id: String,
    pub field_path: String,
}

/// The process-wide mapping from a leaf path to the physical table holding
/// its values. Append-only, except for rebuild-time reaping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexTableMapping {
    /// The dotted leaf path.
    pub key: String,
    /// The allocated physical table name (`idx_<suffix>`).
    pub table_name: String,
}
