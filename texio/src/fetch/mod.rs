//! URL sources.
//!
//! `file://` URLs are opened as local files; `http://` and `https://` URLs are
//! fetched through an [`HttpClient`]. During one dispatch the URL is opened at
//! most once and every decoder that asks for it gets the same stream, rewound
//! to the start.

mod http;

pub use http::{HttpClient, ReqwestClient};

#[cfg(test)]
pub use http::tests::MockHttpClient;

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::config::TextureIoConfig;
use crate::error::TextureError;
use crate::stream::TextureStream;

/// Opens URL sources.
#[derive(Clone)]
pub struct UrlFetcher {
    client: Arc<dyn HttpClient>,
    max_bytes: u64,
}

impl UrlFetcher {
    pub fn new(client: Arc<dyn HttpClient>, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    /// Create a fetcher backed by a reqwest client configured from `config`.
    pub fn from_config(config: &TextureIoConfig) -> Result<Self, TextureError> {
        let client = ReqwestClient::with_timeout(config.http_timeout)?;
        Ok(Self::new(Arc::new(client), config.max_url_bytes))
    }

    /// Open `url` for reading.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty URL or an unsupported scheme, `Io` when a
    /// `file://` target cannot be opened, `Http` when a fetch fails.
    pub fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, TextureError> {
        match UrlKind::parse(url)? {
            UrlKind::File(path) => {
                debug!(url = %url, path = %path.display(), "Opening file URL");
                Ok(Box::new(BufReader::new(File::open(path)?)))
            }
            UrlKind::Http => {
                let body = self.client.get(url, self.max_bytes)?;
                debug!(url = %url, bytes = body.len(), "Fetched URL");
                Ok(Box::new(Cursor::new(body)))
            }
        }
    }
}

impl std::fmt::Debug for UrlFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlFetcher")
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

enum UrlKind {
    File(PathBuf),
    Http,
}

impl UrlKind {
    fn parse(url: &str) -> Result<Self, TextureError> {
        if url.is_empty() {
            return Err(TextureError::InvalidArgument("URL was empty".to_string()));
        }
        let scheme_end = url.find("://").ok_or_else(|| {
            TextureError::InvalidArgument(format!("URL has no scheme: {}", url))
        })?;
        let scheme = url[..scheme_end].to_ascii_lowercase();
        let rest = &url[scheme_end + 3..];

        match scheme.as_str() {
            "file" => {
                let path = rest.strip_prefix("localhost").unwrap_or(rest);
                if path.is_empty() {
                    return Err(TextureError::InvalidArgument(format!(
                        "file URL has no path: {}",
                        url
                    )));
                }
                Ok(UrlKind::File(PathBuf::from(path)))
            }
            "http" | "https" => Ok(UrlKind::Http),
            other => Err(TextureError::InvalidArgument(format!(
                "unsupported URL scheme \"{}\"",
                other
            ))),
        }
    }
}

/// A URL being dispatched, opened lazily on first use.
pub struct UrlSource<'f> {
    url: String,
    fetcher: &'f UrlFetcher,
    stream: Option<TextureStream<'static>>,
}

impl<'f> UrlSource<'f> {
    pub fn new(url: impl Into<String>, fetcher: &'f UrlFetcher) -> Self {
        Self {
            url: url.into(),
            fetcher,
            stream: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the URL has been opened yet.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// The URL's contents as a stream positioned at the start.
    pub fn stream(&mut self) -> Result<&mut TextureStream<'static>, TextureError> {
        if self.stream.is_none() {
            let mut stream = TextureStream::new(self.fetcher.open(&self.url)?);
            stream.mark();
            self.stream = Some(stream);
        }
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TextureError::Http(format!("URL stream unavailable: {}", self.url)))?;
        stream.reset()?;
        Ok(stream)
    }
}
