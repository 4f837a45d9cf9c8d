//! Document metadata. The raw JSON body lives in the blob store, not here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ingested JSON document's metadata row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,

    pub collection_id: String,

    /// The schema discovered at ingest.
    pub schema_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Byte length of the original body.
    pub content_length: i64,

    /// Hex SHA-256 over the original body bytes.
    pub sha256_hash: String,

    pub created_utc: DateTime<Utc>,
    pub last_update_utc: DateTime<Utc>,

    // Hydrated on read; not columns of the documents table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    /// The raw body, attached only when content is requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}
