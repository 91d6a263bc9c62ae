use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ConfigError, env_subst::substitute_env, schema::VetrinaConfig};

const CONFIG_FILENAME: &str = "vetrina.toml";

/// Load config from the given path.
pub fn load_config(path: &Path) -> Result<VetrinaConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let raw = substitute_env(&raw);
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Discover and load config from standard locations.
///
/// Search order: `./vetrina.toml`, then `~/.config/vetrina/vetrina.toml`.
/// A missing file yields defaults; a present-but-broken file is an error —
/// silently falling back to defaults would mask a misconfigured secret.
pub fn discover_and_load() -> Result<VetrinaConfig, ConfigError> {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(VetrinaConfig::default())
        },
    }
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "vetrina") {
        let global = dirs.config_dir().join(CONFIG_FILENAME);
        if global.exists() {
            return Some(global);
        }
    }

    None
}
