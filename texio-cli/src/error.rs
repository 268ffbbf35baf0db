//! CLI error type.

use std::fmt;

use texio::TextureError;

/// Errors reported by CLI commands. Every variant exits with status 1.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file could not be loaded.
    Config(String),
    /// The decoder pipeline could not be set up.
    Setup(TextureError),
    /// Decoding the requested texture failed.
    Decode(TextureError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Setup(e) => write!(f, "Failed to initialize texture I/O: {}", e),
            CliError::Decode(e) => write!(f, "Failed to decode texture: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Setup(e) | CliError::Decode(e) => Some(e),
        }
    }
}
