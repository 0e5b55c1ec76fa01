//! Bulk feed import pipeline: fetching, parsing and asset materialization.
//!
//! The orchestration that drives these pieces lives in
//! [`crate::services::import`].

pub mod assets;
pub mod fetch;
pub mod parse;

use thiserror::Error;

/// Supported feed encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Xml,
    Csv,
    Xlsx,
}

#[derive(Debug, Error)]
#[error("invalid feed format: {0}")]
pub struct InvalidFeedFormat(String);

impl TryFrom<&str> for FeedFormat {
    type Error = InvalidFeedFormat;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(InvalidFeedFormat(other.to_string())),
        }
    }
}
