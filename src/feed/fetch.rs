//! Retrieval of raw feed and image bytes.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::types::FeedUrl;

/// Default timeout for outbound feed and image requests.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a feed comes from: a remote endpoint or an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Url(FeedUrl),
    File(PathBuf),
}

impl FeedSource {
    /// Stable key identifying this source, used by the import run lock.
    pub fn key(&self) -> String {
        match self {
            Self::Url(url) => url.as_str().to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

impl Display for FeedSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Errors raised while retrieving raw bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to construct http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("empty payload from {0}")]
    EmptyBody(String),
    #[error("failed to read feed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Retrieves raw bytes from a remote URL.
///
/// Seam between the import pipeline and the network; tests substitute an
/// in-memory implementation.
pub trait RemoteFetcher {
    fn fetch_url(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`RemoteFetcher`] backed by a blocking reqwest client with a bounded
/// per-request timeout.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch_url(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let map_err = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Request {
                    url: url.to_string(),
                    source,
                }
            }
        };

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(map_err)?;

        let bytes = response.bytes().map_err(map_err)?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody(url.to_string()));
        }
        Ok(bytes.to_vec())
    }
}

/// Retrieve the raw bytes of a feed from its source.
pub fn fetch_feed<F: RemoteFetcher>(
    fetcher: &F,
    source: &FeedSource,
) -> Result<Vec<u8>, FetchError> {
    match source {
        FeedSource::Url(url) => fetcher.fetch_url(url.as_str()),
        FeedSource::File(path) => {
            let bytes = std::fs::read(path).map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?;
            if bytes.is_empty() {
                return Err(FetchError::EmptyBody(path.display().to_string()));
            }
            Ok(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_uploaded_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"<Urunler/>").unwrap();

        let fetcher = HttpFetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap();
        let bytes = fetch_feed(&fetcher, &FeedSource::File(file.path().to_path_buf())).unwrap();
        assert_eq!(bytes, b"<Urunler/>");
    }

    #[test]
    fn empty_uploaded_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let fetcher = HttpFetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap();
        let err = fetch_feed(&fetcher, &FeedSource::File(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, FetchError::EmptyBody(_)));
    }

    #[test]
    fn missing_uploaded_file_is_an_io_error() {
        let fetcher = HttpFetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap();
        let err = fetch_feed(
            &fetcher,
            &FeedSource::File(PathBuf::from("/nonexistent/feed.xml")),
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
