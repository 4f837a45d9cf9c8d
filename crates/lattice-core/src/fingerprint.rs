//! Schema fingerprinting: a flattened document reduces to an ordered element
//! list whose canonical JSON is hashed with SHA-256. Identical shapes yield
//! identical fingerprints across collections and across time.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::enums::DataType;
use crate::flatten::FlattenedDocument;

/// One entry of the canonical element list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementDescriptor {
    pub key: String,
    #[serde(rename = "dataType")]
    pub data_type: DataType,
    pub nullable: bool,
}

/// The discovered shape of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFingerprint {
    /// Hex SHA-256 over the canonical element list.
    pub hash: String,
    /// Elements in first-seen order; the index is the element's position.
    pub elements: Vec<ElementDescriptor>,
}

#[derive(Serialize)]
struct CanonicalSchema<'a> {
    elements: &'a [ElementDescriptor],
}

/// Folds the leaf stream into the canonical element list and hashes it.
///
/// Duplicate `(path, type)` pairs collapse to one entry. A path seen as both
/// `null` and a non-null type keeps the non-null type with `nullable = true`.
/// A path seen with two different non-null types widens to `string` with
/// `nullable = true`. A path seen only as `null` keeps type `null`, nullable.
pub fn fingerprint(doc: &FlattenedDocument) -> SchemaFingerprint {
    let mut elements: Vec<ElementDescriptor> = Vec::new();

    for leaf in &doc.leaves {
        match elements.iter_mut().find(|e| e.key == leaf.path) {
            None => elements.push(ElementDescriptor {
                key: leaf.path.clone(),
                data_type: leaf.kind,
                nullable: leaf.kind == DataType::Null,
            }),
            Some(e) => match (e.data_type, leaf.kind) {
                (a, b) if a == b => {}
                (DataType::Null, other) => {
                    e.data_type = other;
                    e.nullable = true;
                }
                (_, DataType::Null) => e.nullable = true,
                // Two genuinely different non-null types: widen.
                _ => {
                    e.data_type = DataType::String;
                    e.nullable = true;
                }
            },
        }
    }

    let canonical = serde_json::to_string(&CanonicalSchema {
        elements: &elements,
    })
    .expect("canonical schema serialization cannot fail");

    let hash = format!("{:x}", Sha256::digest(canonical.as_bytes()));

    SchemaFingerprint { hash, elements }
}
