//! Clap CLI definitions for the `lattice` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// lattice -- schema-on-write JSON document database test harness.
///
/// Runs the end-to-end scenario suite against the selected backend and
/// exits 0 on pass, 1 on fail.
#[derive(Parser, Debug)]
#[command(
    name = "lattice",
    about = "Lattice document database test harness",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub backend: BackendCommand,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Optional settings file (default: Lattice.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory for collection document directories.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Serialize ingest per collection behind a mutex.
    #[arg(long = "enable-locking", global = true)]
    pub enable_locking: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// Backend selection, mirroring the harness grammar.
#[derive(Subcommand, Debug)]
pub enum BackendCommand {
    /// Run against a SQLite database file.
    Sqlite {
        /// Path to the database file (created when absent).
        file: PathBuf,
    },

    /// Run against a PostgreSQL server.
    Postgresql {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },

    /// Run against a MySQL server.
    Mysql {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },

    /// Run against a SQL Server instance.
    Sqlserver {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
}
