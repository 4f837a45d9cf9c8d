//! Collection types: the named namespace a document lives in.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constraint::FieldConstraintSpec;
use crate::enums::{IndexingMode, SchemaEnforcementMode};

/// A named namespace for documents, with independent constraint and
/// indexing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Filesystem directory that holds the raw document bodies.
    pub documents_directory: String,

    /// Labels attached to the collection itself (set semantics).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Tags attached to the collection itself (map semantics).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub schema_enforcement_mode: SchemaEnforcementMode,

    #[serde(default)]
    pub indexing_mode: IndexingMode,

    pub created_utc: DateTime<Utc>,
    pub last_update_utc: DateTime<Utc>,
}

/// Options for creating a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCollectionOptions {
    pub name: String,

    pub description: Option<String>,

    /// When absent, a directory is generated under the data root.
    pub documents_directory: Option<String>,

    pub labels: Vec<String>,
    pub tags: BTreeMap<String, String>,

    pub schema_enforcement_mode: SchemaEnforcementMode,
    pub indexing_mode: IndexingMode,

    /// Initial field constraints.
    pub field_constraints: Vec<FieldConstraintSpec>,

    /// Initial indexed field paths, honored when `indexing_mode` is
    /// `Selective`.
    pub indexed_fields: Vec<String>,
}

impl CreateCollectionOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn enforcement(mut self, mode: SchemaEnforcementMode) -> Self {
        self.schema_enforcement_mode = mode;
        self
    }

    pub fn indexing(mut self, mode: IndexingMode) -> Self {
        self.indexing_mode = mode;
        self
    }

    pub fn indexed_field(mut self, path: impl Into<String>) -> Self {
        self.indexed_fields.push(path.into());
        self
    }

    pub fn constraint(mut self, spec: FieldConstraintSpec) -> Self {
        self.field_constraints.push(spec);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_builder() {
        let opts = CreateCollectionOptions::new("people")
            .enforcement(SchemaEnforcementMode::Strict)
            .indexing(IndexingMode::Selective)
            .indexed_field("Name");
        assert_eq!(opts.name, "people");
        assert_eq!(opts.schema_enforcement_mode, SchemaEnforcementMode::Strict);
        assert_eq!(opts.indexing_mode, IndexingMode::Selective);
        assert_eq!(opts.indexed_fields, vec!["Name"]);
        assert!(opts.field_constraints.is_empty());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: CreateCollectionOptions =
            serde_json::from_str(r#"{"name": "minimal"}"#).unwrap();
        assert_eq!(opts.name, "minimal");
        assert_eq!(opts.indexing_mode, IndexingMode::All);
        assert_eq!(opts.schema_enforcement_mode, SchemaEnforcementMode::None);
    }
}
