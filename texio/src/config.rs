//! Configuration for texture I/O.
//!
//! Settings can be built in code or loaded from the `[texture_io]` section of
//! an INI file:
//!
//! ```ini
//! [texture_io]
//! http_timeout_secs = 30
//! memory_map_files = true
//! max_url_bytes = 268435456
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use crate::error::TextureError;

/// INI section holding texture I/O settings.
pub const CONFIG_SECTION: &str = "texture_io";

/// Default timeout for HTTP(S) URL sources.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default upper bound on a fetched URL body (256 MiB).
pub const DEFAULT_MAX_URL_BYTES: u64 = 256 * 1024 * 1024;

/// Texture I/O settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureIoConfig {
    /// Timeout for HTTP(S) requests.
    pub http_timeout: Duration,

    /// Memory-map DDS files instead of reading them into memory.
    pub memory_map_files: bool,

    /// Largest URL body that will be fetched.
    pub max_url_bytes: u64,
}

impl Default for TextureIoConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            memory_map_files: true,
            max_url_bytes: DEFAULT_MAX_URL_BYTES,
        }
    }
}

impl TextureIoConfig {
    /// Set the HTTP timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set whether DDS files are memory-mapped.
    pub fn with_memory_map_files(mut self, enabled: bool) -> Self {
        self.memory_map_files = enabled;
        self
    }

    /// Set the maximum URL body size.
    pub fn with_max_url_bytes(mut self, max: u64) -> Self {
        self.max_url_bytes = max;
        self
    }

    /// Load settings from an INI file.
    ///
    /// Missing keys keep their defaults and unknown keys are ignored.
    pub fn from_ini_file(path: &Path) -> Result<Self, TextureError> {
        let ini = Ini::load_from_file(path)
            .map_err(|e| TextureError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_ini(&ini)
    }

    /// Load settings from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, TextureError> {
        let ini = Ini::load_from_str(text).map_err(|e| TextureError::Config(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, TextureError> {
        let mut config = Self::default();
        let Some(section) = ini.section(Some(CONFIG_SECTION)) else {
            return Ok(config);
        };

        if let Some(secs) = parse_key::<u64>(section, "http_timeout_secs")? {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(enabled) = parse_key::<bool>(section, "memory_map_files")? {
            config.memory_map_files = enabled;
        }
        if let Some(max) = parse_key::<u64>(section, "max_url_bytes")? {
            config.max_url_bytes = max;
        }

        Ok(config)
    }
}

fn parse_key<T: FromStr>(section: &Properties, key: &str) -> Result<Option<T>, TextureError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            TextureError::Config(format!(
                "invalid value '{}' for {}.{}",
                raw, CONFIG_SECTION, key
            ))
        }),
    }
}
