//! HTTP client abstraction for testability

use std::io::Read;
use std::time::Duration;

use crate::error::TextureError;

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `max_bytes` - Largest response body accepted
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, TextureError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the given timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TextureError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TextureError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, TextureError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TextureError::Http(format!("Request failed: {}", e)))?;

        // Check HTTP status
        if !response.status().is_success() {
            return Err(TextureError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        if let Some(len) = response.content_length() {
            if len > max_bytes {
                return Err(TextureError::Http(format!(
                    "Response from {} is {} bytes (limit {})",
                    url, len, max_bytes
                )));
            }
        }

        // Read one byte past the limit to detect oversized bodies without a
        // Content-Length header.
        let mut body = Vec::new();
        response
            .take(max_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| TextureError::Http(format!("Failed to read response: {}", e)))?;
        if body.len() as u64 > max_bytes {
            return Err(TextureError::Http(format!(
                "Response from {} exceeds {} bytes",
                url, max_bytes
            )));
        }

        Ok(body)
    }
}
