//! Backend-neutral statements and rows.
//!
//! The core builds [`Statement`]s with `?` placeholders and typed
//! [`SqlValue`] parameters; adapters bind them natively. Query results come
//! back as [`Row`]s with by-name typed accessors.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{Result, StorageError};

/// A typed SQL parameter or cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Integer(v as i64)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// One parameterized SQL statement.
#[derive(Debug, Clone)]
pub struct Statement {
    /// SQL with `?` positional placeholders.
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A statement with no parameters (DDL, fixed queries).
    pub fn bare(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// One result row. Column names are shared across the result set.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Raw cell access by column name.
    pub fn value(&self, column: &str) -> Result<&SqlValue> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| StorageError::decode(format!("no such column: {column}")))?;
        Ok(&self.values[idx])
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<String>> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(s) => Ok(Some(s.clone())),
            // Some backends hand numerics back for text-typed expressions.
            SqlValue::Integer(n) => Ok(Some(n.to_string())),
            SqlValue::Real(n) => Ok(Some(n.to_string())),
        }
    }

    pub fn text(&self, column: &str) -> Result<String> {
        self.opt_text(column)?
            .ok_or_else(|| StorageError::decode(format!("column {column} is NULL")))
    }

    pub fn opt_integer(&self, column: &str) -> Result<Option<i64>> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Integer(n) => Ok(Some(*n)),
            other => Err(StorageError::decode(format!(
                "column {column}: expected integer, got {other:?}"
            ))),
        }
    }

    pub fn integer(&self, column: &str) -> Result<i64> {
        self.opt_integer(column)?
            .ok_or_else(|| StorageError::decode(format!("column {column} is NULL")))
    }

    pub fn opt_real(&self, column: &str) -> Result<Option<f64>> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Real(n) => Ok(Some(*n)),
            SqlValue::Integer(n) => Ok(Some(*n as f64)),
            other => Err(StorageError::decode(format!(
                "column {column}: expected real, got {other:?}"
            ))),
        }
    }

    pub fn boolean(&self, column: &str) -> Result<bool> {
        Ok(self.integer(column)? != 0)
    }

    pub fn datetime(&self, column: &str) -> Result<DateTime<Utc>> {
        let s = self.text(column)?;
        parse_datetime(&s)
            .ok_or_else(|| StorageError::decode(format!("column {column}: bad timestamp '{s}'")))
    }
}

/// Parses the timestamp TEXT formats written by the dialects.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = s.parse::<DateTime<Utc>>() {
        return Some(dt);
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    None
}
