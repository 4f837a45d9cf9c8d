//! JSON flattening: a document tree becomes an ordered stream of typed leaves.
//!
//! Paths are dotted from the root. Object keys are appended verbatim; array
//! elements do not add a segment, so every element of `{"Tags":["a","b"]}`
//! flattens to a leaf at path `Tags`. Container paths are tracked separately
//! so the validator can reason about arrays and objects that emit no leaves.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::enums::DataType;

/// A terminal JSON value and its dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafRecord {
    pub path: String,
    pub kind: DataType,
    pub value: LeafValue,
}

/// The value carried by a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    String(String),
    /// A JSON number with no fractional part or exponent.
    Integer(i64),
    /// Any other JSON number; the original [`serde_json::Number`] is kept so
    /// the encoded form matches the source rendering.
    Number(serde_json::Number),
    Boolean(bool),
    Null,
}

impl LeafValue {
    /// Encodes the value for index storage. `None` means SQL NULL.
    ///
    /// Strings are stored verbatim, booleans as lowercase `true`/`false`,
    /// integers in decimal, numbers with a `.` decimal separator.
    pub fn encode(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Integer(n) => Some(n.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Boolean(b) => Some(if *b { "true" } else { "false" }.to_owned()),
            Self::Null => None,
        }
    }

    /// Numeric view for range checks. `None` for non-numeric leaves.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// The flattened form of one JSON document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedDocument {
    /// Leaves in document order: objects by insertion order of the source,
    /// arrays left to right.
    pub leaves: Vec<LeafRecord>,
    /// Array container paths and their direct element counts. Includes empty
    /// arrays, which emit no leaves.
    pub arrays: BTreeMap<String, usize>,
    /// Object container paths (the root is not recorded). Includes empty
    /// objects.
    pub objects: BTreeSet<String>,
}

impl FlattenedDocument {
    /// Flattens a parsed JSON value.
    pub fn flatten(root: &Value) -> Self {
        let mut out = Self::default();
        walk(root, "", &mut out);
        out
    }

    /// Whether a dotted path exists in the document, either as a leaf or as
    /// a container (possibly empty).
    pub fn has_path(&self, path: &str) -> bool {
        self.arrays.contains_key(path)
            || self.objects.contains(path)
            || self.leaves.iter().any(|l| l.path == path)
    }

    /// All leaves at the given path (several for array elements).
    pub fn leaves_at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a LeafRecord> {
        self.leaves.iter().filter(move |l| l.path == path)
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}.{key}")
    }
}

fn walk(value: &Value, path: &str, out: &mut FlattenedDocument) {
    match value {
        Value::Object(map) => {
            if !path.is_empty() {
                out.objects.insert(path.to_owned());
            }
            for (key, child) in map {
                let child_path = join(path, key);
                walk(child, &child_path, out);
            }
        }
        Value::Array(items) => {
            // Array elements flatten under the array's own path.
            out.arrays.insert(path.to_owned(), items.len());
            for item in items {
                walk(item, path, out);
            }
        }
        Value::String(s) => out.leaves.push(LeafRecord {
            path: path.to_owned(),
            kind: DataType::String,
            value: LeafValue::String(s.clone()),
        }),
        Value::Number(n) => {
            let (kind, value) = match n.as_i64() {
                Some(i) => (DataType::Integer, LeafValue::Integer(i)),
                None => (DataType::Number, LeafValue::Number(n.clone())),
            };
            out.leaves.push(LeafRecord {
                path: path.to_owned(),
                kind,
                value,
            });
        }
        Value::Bool(b) => out.leaves.push(LeafRecord {
            path: path.to_owned(),
            kind: DataType::Boolean,
            value: LeafValue::Boolean(*b),
        }),
        Value::Null => out.leaves.push(LeafRecord {
            path: path.to_owned(),
            kind: DataType::Null,
            value: LeafValue::Null,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn paths(doc: &FlattenedDocument) -> Vec<(&str, DataType)> {
        doc.leaves.iter().map(|l| (l.path.as_str(), l.kind)).collect()
    }

    #[test]
    fn flat_object() {
        let doc = FlattenedDocument::flatten(&json!({"Name": "Joel", "Age": 30}));
        assert_eq!(
            paths(&doc),
            vec![("Name", DataType::String), ("Age", DataType::Integer)]
        );
    }

    #[test]
    fn nested_objects_use_dotted_paths() {
        let doc = FlattenedDocument::flatten(&json!({"Person": {"Name": {"First": "Joel"}}}));
        assert_eq!(paths(&doc), vec![("Person.Name.First", DataType::String)]);
        assert!(doc.objects.contains("Person"));
        assert!(doc.objects.contains("Person.Name"));
    }

    #[test]
    fn arrays_do_not_add_segments() {
        let doc = FlattenedDocument::flatten(&json!({"Tags": ["red", "green"]}));
        assert_eq!(
            paths(&doc),
            vec![("Tags", DataType::String), ("Tags", DataType::String)]
        );
        assert_eq!(doc.arrays.get("Tags"), Some(&2));
    }

    #[test]
    fn objects_inside_arrays_flatten_under_array_path() {
        let doc = FlattenedDocument::flatten(&json!({
            "Items": [{"Sku": "a"}, {"Sku": "b", "Qty": 2}]
        }));
        assert_eq!(
            paths(&doc),
            vec![
                ("Items.Sku", DataType::String),
                ("Items.Sku", DataType::String),
                ("Items.Qty", DataType::Integer),
            ]
        );
    }

    #[test]
    fn empty_containers_emit_no_leaves() {
        let doc = FlattenedDocument::flatten(&json!({"A": {}, "B": []}));
        assert!(doc.leaves.is_empty());
        assert!(doc.objects.contains("A"));
        assert_eq!(doc.arrays.get("B"), Some(&0));
        assert!(doc.has_path("A"));
        assert!(doc.has_path("B"));
        assert!(!doc.has_path("C"));
    }

    #[test]
    fn number_classification() {
        let doc = FlattenedDocument::flatten(&json!({"A": 1, "B": 1.5, "C": 1.0, "D": 1e3}));
        let kinds: Vec<DataType> = doc.leaves.iter().map(|l| l.kind).collect();
        // 1.0 and 1e3 carry a fraction/exponent in the source, so they are
        // numbers even though they are mathematically whole.
        assert_eq!(
            kinds,
            vec![
                DataType::Integer,
                DataType::Number,
                DataType::Number,
                DataType::Number,
            ]
        );
    }

    #[test]
    fn value_encoding() {
        assert_eq!(LeafValue::String("x".into()).encode(), Some("x".into()));
        assert_eq!(LeafValue::Boolean(true).encode(), Some("true".into()));
        assert_eq!(LeafValue::Boolean(false).encode(), Some("false".into()));
        assert_eq!(LeafValue::Integer(-42).encode(), Some("-42".into()));
        assert_eq!(LeafValue::Null.encode(), None);

        let doc = FlattenedDocument::flatten(&json!({"N": 2.5}));
        assert_eq!(doc.leaves[0].value.encode(), Some("2.5".into()));
    }

    #[test]
    fn null_leaves_are_recorded() {
        let doc = FlattenedDocument::flatten(&json!({"Gone": null}));
        assert_eq!(paths(&doc), vec![("Gone", DataType::Null)]);
        assert!(doc.leaves[0].value.is_null());
    }

    #[test]
    fn object_insertion_order_is_preserved() {
        let value: Value = serde_json::from_str(r#"{"Z": 1, "A": 2, "M": 3}"#).unwrap();
        let doc = FlattenedDocument::flatten(&value);
        let order: Vec<&str> = doc.leaves.iter().map(|l| l.path.as_str()).collect();
        assert_eq!(order, vec!["Z", "A", "M"]);
    }
}
