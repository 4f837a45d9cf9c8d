//! Discovered schemas and their elements.
//!
//! Schemas are global (shared across collections) and immutable: a new
//! document shape always produces a new schema row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::DataType;

/// The immutable identity of a document shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub id: String,

    /// Stable fingerprint of the element list (hex SHA-256).
    pub hash: String,

    pub created_utc: DateTime<Utc>,
    pub last_update_utc: DateTime<Utc>,
}

/// One typed leaf path of a schema. Elements are ordered by `position`
/// ascending and together enumerate the schema's leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaElement {
    pub id: String,

    pub schema_id: String,

    /// Index in the canonical element list.
    pub position: i64,

    /// Dotted leaf path.
    pub key: String,

    pub data_type: DataType,

    pub nullable: bool,
}
