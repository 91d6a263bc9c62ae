//! Configuration loading, env substitution, and fail-fast validation.
//!
//! Config file: `vetrina.toml`, searched in `./` then `~/.config/vetrina/`.
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file before parsing.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{discover_and_load, load_config},
    schema::{
        DatabaseConfig, HttpConfig, ProviderSettings, SecretsConfig, ServerConfig, VetrinaConfig,
    },
    validate::{Diagnostic, Severity, has_errors, validate},
};

/// Error loading or parsing a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
