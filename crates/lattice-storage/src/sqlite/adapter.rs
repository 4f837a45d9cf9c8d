//! [`SqliteAdapter`] -- rusqlite-backed implementation of [`SqlAdapter`].

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use rusqlite::types::ValueRef;
use tracing::{debug, info};

use crate::adapter::SqlAdapter;
use crate::dialect::Dialect;
use crate::error::{Result, StorageError};
use crate::value::{Row, SqlValue, Statement};

/// SQLite implementation of the [`SqlAdapter`] trait.
///
/// Wraps a [`rusqlite::Connection`] in a `Mutex` for thread safety. All
/// methods acquire the lock, run their SQL, and release it.
pub struct SqliteAdapter {
    conn: Mutex<Connection>,
}

impl SqliteAdapter {
    /// Opens (or creates) a SQLite database at the given path.
    ///
    /// Enables WAL mode, foreign keys, and a busy timeout.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(?path, "opening SQLite database");

        let conn = Connection::open(path).map_err(|e| {
            StorageError::Connection(format!("failed to open {}: {e}", path.display()))
        })?;

        let adapter = Self {
            conn: Mutex::new(conn),
        };
        adapter.configure_connection()?;
        Ok(adapter)
    }

    /// Opens an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        debug!("opening in-memory SQLite database");
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("failed to open in-memory db: {e}")))?;

        let adapter = Self {
            conn: Mutex::new(conn),
        };
        adapter.configure_connection()?;
        Ok(adapter)
    }

    fn configure_connection(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| StorageError::Connection(format!("failed to set pragmas: {e}")))?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Connection(format!("mutex poisoned: {e}")))
    }
}

impl SqlAdapter for SqliteAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&self, stmt: &Statement) -> Result<usize> {
        let conn = self.lock_conn()?;
        execute_on_conn(&conn, stmt)
    }

    fn query(&self, stmt: &Statement) -> Result<Vec<Row>> {
        let conn = self.lock_conn()?;
        let mut prepared = conn.prepare(&stmt.sql)?;
        let columns: Arc<Vec<String>> = Arc::new(
            prepared
                .column_names()
                .into_iter()
                .map(str::to_owned)
                .collect(),
        );
        let count = columns.len();

        let params = bind_params(&stmt.params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params.iter().map(|p| p as &dyn rusqlite::types::ToSql).collect();

        let rows = prepared.query_map(param_refs.as_slice(), |row| {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                values.push(from_value_ref(row.get_ref(i)?));
            }
            Ok(Row::new(Arc::clone(&columns), values))
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn execute_transaction(&self, stmts: &[Statement]) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;

        for stmt in stmts {
            // An error drops the transaction, which rolls it back.
            execute_on_conn(&tx, stmt)?;
        }

        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        Ok(())
    }
}

fn execute_on_conn(conn: &Connection, stmt: &Statement) -> Result<usize> {
    let params = bind_params(&stmt.params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params.iter().map(|p| p as &dyn rusqlite::types::ToSql).collect();
    Ok(conn.execute(&stmt.sql, param_refs.as_slice())?)
}

fn bind_params(params: &[SqlValue]) -> Vec<rusqlite::types::Value> {
    params
        .iter()
        .map(|p| match p {
            SqlValue::Null => rusqlite::types::Value::Null,
            SqlValue::Integer(n) => rusqlite::types::Value::Integer(*n),
            SqlValue::Real(n) => rusqlite::types::Value::Real(*n),
            SqlValue::Text(s) => rusqlite::types::Value::Text(s.clone()),
        })
        .collect()
}

fn from_value_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(n) => SqlValue::Integer(n),
        ValueRef::Real(n) => SqlValue::Real(n),
        ValueRef::Text(s) => SqlValue::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => SqlValue::Text(String::from_utf8_lossy(b).into_owned()),
    }
}

impl std::fmt::Debug for SqliteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteAdapter").finish_non_exhaustive()
    }
}
