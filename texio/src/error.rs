//! Error types for texture decoding operations.

use thiserror::Error;

/// Errors that can occur while decoding or uploading a texture.
///
/// Note that "no decoder recognized this input" is not represented here:
/// dispatch reports it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum TextureError {
    /// The caller passed an argument that can never succeed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The input was recognized but its bytes violate the format's layout.
    #[error("Malformed {format} data: {reason}")]
    Malformed { format: &'static str, reason: String },

    /// The input was recognized but uses a feature this decoder cannot map.
    #[error("Unsupported {format} content: {reason}")]
    Unsupported { format: &'static str, reason: String },

    /// I/O error while reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fetching a URL source failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The GPU upload adapter reported a failure.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TextureError {
    /// Shorthand for a [`TextureError::Malformed`] error.
    pub fn malformed(format: &'static str, reason: impl Into<String>) -> Self {
        TextureError::Malformed {
            format,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`TextureError::Unsupported`] error.
    pub fn unsupported(format: &'static str, reason: impl Into<String>) -> Self {
        TextureError::Unsupported {
            format,
            reason: reason.into(),
        }
    }

    /// Whether this error means a decoder recognized the input but could not
    /// decode it.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            TextureError::Malformed { .. } | TextureError::Unsupported { .. }
        )
    }
}
