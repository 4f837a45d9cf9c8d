//! Field-constraint rows.

use lattice_core::constraint::FieldConstraint;
use lattice_core::enums::DataType;

use crate::adapter::SqlAdapter;
use crate::error::{Result, StorageError};
use crate::value::{Row, Statement};

pub const CONSTRAINT_COLUMNS: &str = "id, collectionid, fieldpath, datatype, required, nullable, \
     regexpattern, minvalue, maxvalue, minlength, maxlength, allowedvalues, arrayelementtype";

fn parse_opt_data_type(value: Option<String>, column: &str) -> Result<Option<DataType>> {
    value
        .map(|s| {
            DataType::parse(&s)
                .ok_or_else(|| StorageError::decode(format!("bad {column} '{s}'")))
        })
        .transpose()
}

pub fn scan_constraint(row: &Row) -> Result<FieldConstraint> {
    let allowed_values: Option<Vec<String>> = row
        .opt_text("allowedvalues")?
        .map(|s| serde_json::from_str(&s))
        .transpose()?;

    Ok(FieldConstraint {
        id: row.text("id")?,
        collection_id: row.text("collectionid")?,
        field_path: row.text("fieldpath")?,
        data_type: parse_opt_data_type(row.opt_text("datatype")?, "datatype")?,
        required: row.boolean("required")?,
        nullable: row.boolean("nullable")?,
        regex_pattern: row.opt_text("regexpattern")?,
        min_value: row.opt_real("minvalue")?,
        max_value: row.opt_real("maxvalue")?,
        min_length: row.opt_integer("minlength")?,
        max_length: row.opt_integer("maxlength")?,
        allowed_values,
        array_element_type: parse_opt_data_type(
            row.opt_text("arrayelementtype")?,
            "arrayelementtype",
        )?,
    })
}

fn insert_statement(constraint: &FieldConstraint) -> Result<Statement> {
    let allowed_json = constraint
        .allowed_values
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    Ok(Statement::new(
        format!(
            "INSERT INTO field_constraints ({CONSTRAINT_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ),
        vec![
            constraint.id.as_str().into(),
            constraint.collection_id.as_str().into(),
            constraint.field_path.as_str().into(),
            constraint.data_type.map(|d| d.as_str().to_owned()).into(),
            constraint.required.into(),
            constraint.nullable.into(),
            constraint.regex_pattern.clone().into(),
            constraint.min_value.into(),
            constraint.max_value.into(),
            constraint.min_length.into(),
            constraint.max_length.into(),
            allowed_json.into(),
            constraint
                .array_element_type
                .map(|d| d.as_str().to_owned())
                .into(),
        ],
    ))
}

/// Replaces a collection's constraints in one transaction.
pub fn replace(
    adapter: &dyn SqlAdapter,
    collection_id: &str,
    constraints: &[FieldConstraint],
) -> Result<()> {
    let mut stmts = vec![delete_all_statement(collection_id)];
    for constraint in constraints {
        stmts.push(insert_statement(constraint)?);
    }
    adapter.execute_transaction(&stmts)
}

/// All constraints of one collection.
pub fn for_collection(
    adapter: &dyn SqlAdapter,
    collection_id: &str,
) -> Result<Vec<FieldConstraint>> {
    let rows = adapter.query(&Statement::new(
        format!(
            "SELECT {CONSTRAINT_COLUMNS} FROM field_constraints \
             WHERE collectionid = ? ORDER BY fieldpath"
        ),
        vec![collection_id.into()],
    ))?;
    rows.iter().map(scan_constraint).collect()
}

/// Statement removing all constraints of one collection.
pub fn delete_all_statement(collection_id: &str) -> Statement {
    Statement::new(
        "DELETE FROM field_constraints WHERE collectionid = ?",
        vec![collection_id.into()],
    )
}
