use std::path::PathBuf;
use std::time::Duration;

/// Configuration options for the catalog back office.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Root directory for product image storage; one subdirectory per
    /// product id.
    pub image_root: PathBuf,
    /// Directory for preview video storage.
    pub video_root: PathBuf,
    /// URL of the remote XML product feed.
    pub feed_url: String,
    /// Timeout applied to every outbound feed/image request.
    pub fetch_timeout: Duration,
}
