mod schema;

pub use schema::{date_tag, AppConfig, FileConfig};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scoring::validate_policy;

/// Config file looked for in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "mast.yaml";

/// Get the user config directory path (~/.config/mast/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("mast"))
}

/// Get the user config file path (~/.config/mast/config.yaml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.yaml"))
}

/// Resolve which config file to read, if any.
///
/// An explicit path must exist. Otherwise `mast.yaml` in the working
/// directory wins over the user config; with neither, built-in defaults apply.
fn resolve_config_path(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found at {}", path.display());
        }
        return Ok(Some(path));
    }
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Ok(Some(local));
    }
    Ok(get_config_path().filter(|path| path.exists()))
}

/// Load configuration from a YAML file and validate its scoring policy.
///
/// # Errors
///
/// Returns an error if:
/// - An explicit config path does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
/// - The scoring policy is inconsistent (all problems are listed)
pub fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = match resolve_config_path(path)? {
        Some(path) => read_config(&path)?,
        None => {
            tracing::debug!("no config file found, using defaults");
            AppConfig::default()
        }
    };

    validate_policy(&config.policy)
        .map_err(crate::error::MastError::Policy)
        .context("Invalid scoring policy")?;

    Ok(config)
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: AppConfig = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", path.display()))?;

    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
