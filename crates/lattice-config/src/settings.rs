//! Typed settings and their loading rules.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or merged.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Which relational backend to target and how to reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendSettings {
    /// SQLite file database.
    Sqlite { file: PathBuf },
    /// PostgreSQL server (requires an external adapter build).
    Postgresql {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
    /// MySQL server (requires an external adapter build).
    Mysql {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
    /// SQL Server (requires an external adapter build).
    Sqlserver {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::Sqlite {
            file: PathBuf::from("lattice.db"),
        }
    }
}

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeSettings {
    /// The relational backend.
    pub backend: BackendSettings,

    /// Root directory for collection document directories.
    pub data_dir: PathBuf,

    /// Serialize ingest per collection.
    pub enable_object_locking: bool,

    /// Default tracing filter, e.g. `lattice=info`.
    pub log_filter: String,
}

impl Default for LatticeSettings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            data_dir: PathBuf::from("lattice-data"),
            enable_object_locking: false,
            log_filter: "lattice=info".to_owned(),
        }
    }
}

impl LatticeSettings {
    /// Loads settings from a TOML file (when present) merged with
    /// `LATTICE_*` environment variables; the environment wins.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let toml_path = path.unwrap_or_else(|| Path::new("Lattice.toml"));
        let settings: Self = Figment::new()
            .merge(Toml::file(toml_path))
            .merge(Env::prefixed("LATTICE_").split("__"))
            .extract()
            .map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        match &self.backend {
            BackendSettings::Sqlite { file } => {
                if file.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: "backend.file".into(),
                        reason: "sqlite file path must not be empty".into(),
                    });
                }
            }
            BackendSettings::Postgresql { port, database, .. }
            | BackendSettings::Mysql { port, database, .. }
            | BackendSettings::Sqlserver { port, database, .. } => {
                if *port == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "backend.port".into(),
                        reason: "port must be non-zero".into(),
                    });
                }
                if database.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: "backend.database".into(),
                        reason: "database name must not be empty".into(),
                    });
                }
            }
        }
        Ok(())
    }
}
