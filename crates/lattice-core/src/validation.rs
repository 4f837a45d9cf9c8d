//! Field-constraint validation.
//!
//! The validator runs against a flattened document under one of four
//! enforcement modes and accumulates every violation before raising, so a
//! caller sees the full list of problems in one round trip.

use regex::Regex;

use crate::constraint::FieldConstraint;
use crate::enums::{DataType, SchemaEnforcementMode};
use crate::flatten::{FlattenedDocument, LeafValue};

use crate::enums::string_enum;

string_enum! {
    /// Stable error-code vocabulary carried by every validation error.
    ErrorCode, default = TypeMismatch,
    variants: [
        (MissingRequiredField, "MISSING_REQUIRED_FIELD"),
        (NullNotAllowed, "NULL_NOT_ALLOWED"),
        (TypeMismatch, "TYPE_MISMATCH"),
        (PatternMismatch, "PATTERN_MISMATCH"),
        (ValueTooSmall, "VALUE_TOO_SMALL"),
        (ValueTooLarge, "VALUE_TOO_LARGE"),
        (StringTooShort, "STRING_TOO_SHORT"),
        (ArrayTooShort, "ARRAY_TOO_SHORT"),
        (StringTooLong, "STRING_TOO_LONG"),
        (ArrayTooLong, "ARRAY_TOO_LONG"),
        (ValueNotAllowed, "VALUE_NOT_ALLOWED"),
        (InvalidArrayElement, "INVALID_ARRAY_ELEMENT"),
        (UnexpectedField, "UNEXPECTED_FIELD"),
    ]
}

/// One violation found by the validator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub error_code: ErrorCode,
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    fn new(code: ErrorCode, path: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: code,
            field_path: path.to_owned(),
            message: message.into(),
        }
    }
}

/// The accumulated outcome of a failed validation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("document rejected with {} validation error(s)", .errors.len())]
pub struct ConstraintViolations {
    pub errors: Vec<ValidationError>,
}

/// A constraint's regex pattern did not compile. Raised when constraints
/// are written, never during ingest.
#[derive(Debug, thiserror::Error)]
#[error("invalid regex pattern for field '{field_path}': {source}")]
pub struct InvalidPatternError {
    pub field_path: String,
    #[source]
    pub source: regex::Error,
}

/// A constraint with its pattern compiled once, full-match anchored.
#[derive(Debug)]
pub struct CompiledConstraint {
    pub constraint: FieldConstraint,
    regex: Option<Regex>,
}

/// Compiles constraint patterns up front.
pub fn compile(
    constraints: Vec<FieldConstraint>,
) -> Result<Vec<CompiledConstraint>, InvalidPatternError> {
    constraints
        .into_iter()
        .map(|constraint| {
            let regex = match &constraint.regex_pattern {
                Some(pattern) => Some(
                    // Anchor so the pattern must match the whole value.
                    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                        InvalidPatternError {
                            field_path: constraint.field_path.clone(),
                            source,
                        }
                    })?,
                ),
                None => None,
            };
            Ok(CompiledConstraint { constraint, regex })
        })
        .collect()
}

/// Validates a flattened document against the collection's constraints.
///
/// Every applicable check runs and every error is collected before the
/// result is decided.
pub fn validate(
    doc: &FlattenedDocument,
    mode: SchemaEnforcementMode,
    constraints: &[CompiledConstraint],
) -> Result<(), ConstraintViolations> {
    if mode == SchemaEnforcementMode::None {
        return Ok(());
    }

    let mut errors: Vec<ValidationError> = Vec::new();

    for compiled in constraints {
        check_constraint(doc, mode, compiled, &mut errors);
    }

    if mode == SchemaEnforcementMode::Strict {
        check_unexpected_fields(doc, constraints, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConstraintViolations { errors })
    }
}

fn check_constraint(
    doc: &FlattenedDocument,
    mode: SchemaEnforcementMode,
    compiled: &CompiledConstraint,
    errors: &mut Vec<ValidationError>,
) {
    let c = &compiled.constraint;
    let path = c.field_path.as_str();

    if !doc.has_path(path) {
        // `required` is inert in Partial mode; absent paths skip all checks.
        if c.required && mode != SchemaEnforcementMode::Partial {
            errors.push(ValidationError::new(
                ErrorCode::MissingRequiredField,
                path,
                "required field is missing",
            ));
        }
        return;
    }

    let leaves: Vec<_> = doc.leaves_at(path).collect();
    let array_len = doc.arrays.get(path).copied();

    if !c.nullable && leaves.iter().any(|l| l.value.is_null()) {
        errors.push(ValidationError::new(
            ErrorCode::NullNotAllowed,
            path,
            "null is not allowed",
        ));
    }

    if let Some(declared) = c.data_type {
        match declared {
            DataType::Array => {
                if array_len.is_none() {
                    errors.push(ValidationError::new(
                        ErrorCode::TypeMismatch,
                        path,
                        "expected array",
                    ));
                }
            }
            DataType::Object => {
                if !doc.objects.contains(path) {
                    errors.push(ValidationError::new(
                        ErrorCode::TypeMismatch,
                        path,
                        "expected object",
                    ));
                }
            }
            _ => {
                for leaf in leaves.iter().filter(|l| !l.value.is_null()) {
                    if !declared.accepts_leaf(leaf.kind) {
                        errors.push(ValidationError::new(
                            ErrorCode::TypeMismatch,
                            path,
                            format!("expected {declared}, found {}", leaf.kind),
                        ));
                    }
                }
            }
        }
    }

    if let Some(regex) = &compiled.regex {
        for leaf in &leaves {
            if let LeafValue::String(s) = &leaf.value {
                if !regex.is_match(s) {
                    errors.push(ValidationError::new(
                        ErrorCode::PatternMismatch,
                        path,
                        format!("value '{s}' does not match the required pattern"),
                    ));
                }
            }
        }
    }

    if let Some(min) = c.min_value {
        for leaf in &leaves {
            if let Some(v) = leaf.value.as_f64() {
                if v < min {
                    errors.push(ValidationError::new(
                        ErrorCode::ValueTooSmall,
                        path,
                        format!("value {v} is below the minimum {min}"),
                    ));
                }
            }
        }
    }

    if let Some(max) = c.max_value {
        for leaf in &leaves {
            if let Some(v) = leaf.value.as_f64() {
                if v > max {
                    errors.push(ValidationError::new(
                        ErrorCode::ValueTooLarge,
                        path,
                        format!("value {v} is above the maximum {max}"),
                    ));
                }
            }
        }
    }

    if let Some(min) = c.min_length {
        if let Some(n) = array_len {
            if (n as i64) < min {
                errors.push(ValidationError::new(
                    ErrorCode::ArrayTooShort,
                    path,
                    format!("array has {n} element(s), minimum is {min}"),
                ));
            }
        }
        for leaf in &leaves {
            if let LeafValue::String(s) = &leaf.value {
                let len = s.chars().count() as i64;
                if len < min {
                    errors.push(ValidationError::new(
                        ErrorCode::StringTooShort,
                        path,
                        format!("string has {len} char(s), minimum is {min}"),
                    ));
                }
            }
        }
    }

    if let Some(max) = c.max_length {
        if let Some(n) = array_len {
            if (n as i64) > max {
                errors.push(ValidationError::new(
                    ErrorCode::ArrayTooLong,
                    path,
                    format!("array has {n} element(s), maximum is {max}"),
                ));
            }
        }
        for leaf in &leaves {
            if let LeafValue::String(s) = &leaf.value {
                let len = s.chars().count() as i64;
                if len > max {
                    errors.push(ValidationError::new(
                        ErrorCode::StringTooLong,
                        path,
                        format!("string has {len} char(s), maximum is {max}"),
                    ));
                }
            }
        }
    }

    if let Some(allowed) = &c.allowed_values {
        for leaf in &leaves {
            if let LeafValue::String(s) = &leaf.value {
                if !allowed.iter().any(|a| a == s) {
                    errors.push(ValidationError::new(
                        ErrorCode::ValueNotAllowed,
                        path,
                        format!("value '{s}' is not in the allowed set"),
                    ));
                }
            }
        }
    }

    if let Some(element_type) = c.array_element_type {
        if array_len.is_some() {
            for leaf in leaves.iter().filter(|l| !l.value.is_null()) {
                if !element_type.accepts_leaf(leaf.kind) {
                    errors.push(ValidationError::new(
                        ErrorCode::InvalidArrayElement,
                        path,
                        format!("array element is {}, expected {element_type}", leaf.kind),
                    ));
                }
            }
        }
    }
}

/// Strict mode: every leaf path must be covered by a constraint, either
/// exactly or by a constraint on one of its ancestors.
fn check_unexpected_fields(
    doc: &FlattenedDocument,
    constraints: &[CompiledConstraint],
    errors: &mut Vec<ValidationError>,
) {
    let mut seen: Vec<&str> = Vec::new();
    for leaf in &doc.leaves {
        let path = leaf.path.as_str();
        if seen.contains(&path) {
            continue;
        }
        seen.push(path);

        let covered = constraints.iter().any(|cc| {
            let cp = cc.constraint.field_path.as_str();
            path == cp || (path.len() > cp.len() && path.starts_with(cp) && path.as_bytes()[cp.len()] == b'.')
        });
        if !covered {
            errors.push(ValidationError::new(
                ErrorCode::UnexpectedField,
                path,
                "field is not covered by any constraint",
            ));
        }
    }
}
