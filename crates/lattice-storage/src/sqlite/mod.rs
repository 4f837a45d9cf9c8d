//! SQLite backend adapter.

mod adapter;

pub use adapter::SqliteAdapter;
