//! Common helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use texio::TextureIoConfig;
use tracing::debug;

use crate::error::CliError;

/// Default configuration file: `<config dir>/texio/config.ini`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("texio").join("config.ini"))
}

/// Load configuration from `explicit`, or from the default path when it
/// exists. Falls back to defaults when neither is available.
pub fn load_config(explicit: Option<&Path>) -> Result<TextureIoConfig, CliError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => {
                debug!("No configuration file, using defaults");
                return Ok(TextureIoConfig::default());
            }
        },
    };

    debug!(path = %path.display(), "Loading configuration");
    TextureIoConfig::from_ini_file(&path).map_err(|e| CliError::Config(e.to_string()))
}
