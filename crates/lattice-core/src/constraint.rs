//! Field constraints: per-collection validation rules for leaf paths.

use serde::{Deserialize, Serialize};

use crate::enums::DataType;
use crate::ids::{IdKind, new_id};

/// A persisted constraint row, bound to a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConstraint {
    pub id: String,
    pub collection_id: String,

    /// Dotted leaf or container path this constraint applies to.
    pub field_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,

    #[serde(default)]
    pub required: bool,

    /// Whether a JSON `null` at this path is acceptable. Defaults to true:
    /// constraints restrict only what they state.
    #[serde(default = "default_true")]
    pub nullable: bool,

    /// Full-match pattern for string values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    /// Minimum string length (chars) or array length (elements).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_element_type: Option<DataType>,
}

fn default_true() -> bool {
    true
}

/// A constraint without identity, as supplied by callers. Bound to a
/// collection with [`FieldConstraintSpec::into_constraint`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConstraintSpec {
    pub field_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,

    #[serde(default)]
    pub required: bool,

    #[serde(default = "default_true")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_element_type: Option<DataType>,
}

impl FieldConstraintSpec {
    pub fn new(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            data_type: None,
            required: false,
            nullable: true,
            regex_pattern: None,
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            allowed_values: None,
            array_element_type: None,
        }
    }

    pub fn data_type(mut self, dt: DataType) -> Self {
        self.data_type = Some(dt);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn not_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.regex_pattern = Some(pattern.into());
        self
    }

    pub fn min_value(mut self, v: f64) -> Self {
        self.min_value = Some(v);
        self
    }

    pub fn max_value(mut self, v: f64) -> Self {
        self.max_value = Some(v);
        self
    }

    pub fn min_length(mut self, n: i64) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: i64) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn array_element_type(mut self, dt: DataType) -> Self {
        self.array_element_type = Some(dt);
        self
    }

    /// Binds the spec to a collection, generating its identity.
    pub fn into_constraint(self, collection_id: &str) -> FieldConstraint {
        FieldConstraint {
            id: new_id(IdKind::FieldConstraint),
            collection_id: collection_id.to_owned(),
            field_path: self.field_path,
            data_type: self.data_type,
            required: self.required,
            nullable: self.nullable,
            regex_pattern: self.regex_pattern,
            min_value: self.min_value,
            max_value: self.max_value,
            min_length: self.min_length,
            max_length: self.max_length,
            allowed_values: self.allowed_values,
            array_element_type: self.array_element_type,
        }
    }
}
