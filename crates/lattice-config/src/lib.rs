//! Configuration loading for Lattice.
//!
//! Settings merge from an optional `Lattice.toml` and `LATTICE_*`
//! environment variables (environment wins). The main entry point is
//! [`LatticeSettings::load`].

pub mod settings;

pub use settings::{BackendSettings, ConfigError, LatticeSettings};
