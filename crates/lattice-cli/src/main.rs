//! `lattice` -- document database test harness CLI.
//!
//! Parses backend selection with clap, wires settings and signal handling,
//! then runs the end-to-end scenario suite. Exit code 0 on pass, 1 on fail.

mod cli;
mod harness;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use lattice_config::{BackendSettings, LatticeSettings};
use lattice_db::{Lattice, LatticeOptions};
use lattice_storage::{DocumentBlobStore, FsBlobStore, SqlAdapter, SqliteAdapter};

use cli::{BackendCommand, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.global.verbose {
        "lattice=debug".to_owned()
    } else {
        LatticeSettings::default().log_filter
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => {
            println!("all scenarios passed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "harness failed");
            eprintln!("FAIL: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = LatticeSettings::load(cli.global.config.as_deref())?;
    if let Some(data_dir) = cli.global.data_dir {
        settings.data_dir = data_dir;
    }
    settings.enable_object_locking |= cli.global.enable_locking;
    settings.backend = backend_from_command(cli.backend);

    let adapter: Arc<dyn SqlAdapter> = match &settings.backend {
        BackendSettings::Sqlite { file } => Arc::new(SqliteAdapter::open(file)?),
        BackendSettings::Postgresql { .. }
        | BackendSettings::Mysql { .. }
        | BackendSettings::Sqlserver { .. } => {
            anyhow::bail!(
                "this build ships only the SQLite adapter; server backends \
                 require an external SqlAdapter implementation"
            );
        }
    };
    let blobs: Arc<dyn DocumentBlobStore> = Arc::new(FsBlobStore::new(&settings.data_dir));

    let db = Lattice::open(
        adapter,
        blobs,
        LatticeOptions {
            enable_object_locking: settings.enable_object_locking,
            ..LatticeOptions::default()
        },
    )?;

    // First Ctrl+C cancels long loops cooperatively; second forces exit.
    let token = db.cancel_token();
    let _ = ctrlc::set_handler(move || {
        if token.is_cancelled() {
            std::process::exit(1);
        }
        token.cancel();
    });

    harness::run(&db)
}

fn backend_from_command(command: BackendCommand) -> BackendSettings {
    match command {
        BackendCommand::Sqlite { file } => BackendSettings::Sqlite { file },
        BackendCommand::Postgresql {
            host,
            port,
            user,
            password,
            database,
        } => BackendSettings::Postgresql {
            host,
            port,
            user,
            password,
            database,
        },
        BackendCommand::Mysql {
            host,
            port,
            user,
            password,
            database,
        } => BackendSettings::Mysql {
            host,
            port,
            user,
            password,
            database,
        },
        BackendCommand::Sqlserver {
            host,
            port,
            user,
            password,
            database,
        } => BackendSettings::Sqlserver {
            host,
            port,
            user,
            password,
            database,
        },
    }
}
