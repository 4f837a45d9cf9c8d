//! The SQL adapter seam.
//!
//! The engine depends on this trait rather than a concrete driver, so
//! alternative backends can be substituted. One adapter instance owns its
//! connection management; the engine never holds a connection across
//! blob I/O.

use crate::dialect::Dialect;
use crate::error::Result;
use crate::value::{Row, Statement};

/// A connection to one relational backend.
pub trait SqlAdapter: Send + Sync {
    /// The dialect this adapter speaks.
    fn dialect(&self) -> Dialect;

    /// Executes a statement, returning the affected row count.
    fn execute(&self, stmt: &Statement) -> Result<usize>;

    /// Runs a query and materializes its rows.
    fn query(&self, stmt: &Statement) -> Result<Vec<Row>>;

    /// Executes all statements in one transaction: either every statement
    /// commits or none do.
    fn execute_transaction(&self, stmts: &[Statement]) -> Result<()>;
}
