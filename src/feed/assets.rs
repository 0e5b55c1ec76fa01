//! Filesystem storage for product images and preview videos.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::types::{ImageUrl, ProductId, StoredFileName};
use crate::feed::fetch::{FetchError, RemoteFetcher};

/// Errors affecting a single stored asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid image reference `{0}`")]
    InvalidReference(String),
    #[error("failed to download image {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to create directory {path}: {source}")]
    Dir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to copy file {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of materializing the image references of one record.
///
/// Stored names and per-image failures are collected side by side; a failed
/// image never aborts the others.
#[derive(Debug, Default)]
pub struct MaterializedAssets {
    pub stored: Vec<StoredFileName>,
    pub failures: Vec<AssetError>,
}

/// Image and video storage rooted at configured directories, with one
/// subdirectory per product id for images.
#[derive(Debug, Clone)]
pub struct AssetStore {
    image_root: PathBuf,
    video_root: PathBuf,
}

impl AssetStore {
    pub fn new(image_root: impl Into<PathBuf>, video_root: impl Into<PathBuf>) -> Self {
        Self {
            image_root: image_root.into(),
            video_root: video_root.into(),
        }
    }

    /// Directory holding the image files of one product.
    pub fn product_dir(&self, product_id: ProductId) -> PathBuf {
        self.image_root.join(product_id.to_string())
    }

    /// Full path of one stored image file.
    pub fn image_path(&self, product_id: ProductId, file_name: &str) -> PathBuf {
        self.product_dir(product_id).join(file_name)
    }

    /// Full path of one stored preview video.
    pub fn video_path(&self, file_name: &str) -> PathBuf {
        self.video_root.join(file_name)
    }

    /// Download and store every image reference of a record.
    ///
    /// The product directory is created if absent (idempotent, tolerant of
    /// concurrent creation). Each failed reference is recorded and the
    /// remaining ones continue.
    pub fn materialize<F: RemoteFetcher>(
        &self,
        fetcher: &F,
        product_id: ProductId,
        references: &[String],
    ) -> MaterializedAssets {
        let mut out = MaterializedAssets::default();
        if references.is_empty() {
            return out;
        }

        let dir = match self.ensure_dir(self.product_dir(product_id)) {
            Ok(dir) => dir,
            Err(e) => {
                // Without the directory no image can land; fail them all.
                out.failures.push(e);
                return out;
            }
        };

        let mut taken = HashSet::new();
        for (position, reference) in references.iter().enumerate() {
            match self.materialize_one(fetcher, &dir, position, reference, &mut taken) {
                Ok(name) => out.stored.push(name),
                Err(e) => out.failures.push(e),
            }
        }

        out
    }

    fn materialize_one<F: RemoteFetcher>(
        &self,
        fetcher: &F,
        dir: &Path,
        position: usize,
        reference: &str,
        taken: &mut HashSet<String>,
    ) -> Result<StoredFileName, AssetError> {
        let url = ImageUrl::new(reference)
            .map_err(|_| AssetError::InvalidReference(reference.to_string()))?;

        let bytes = fetcher
            .fetch_url(url.as_str())
            .map_err(|source| AssetError::Download {
                url: url.as_str().to_string(),
                source,
            })?;

        let name = unique_file_name(dir, taken, position, file_name_from_url(url.as_str()));
        let path = dir.join(&name);
        std::fs::write(&path, &bytes).map_err(|source| AssetError::Write {
            path: path.clone(),
            source,
        })?;

        taken.insert(name.clone());
        StoredFileName::new(name).map_err(|_| AssetError::InvalidReference(reference.to_string()))
    }

    /// Store uploaded image bytes under the product's directory.
    pub fn store_image(
        &self,
        product_id: ProductId,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFileName, AssetError> {
        let dir = self.ensure_dir(self.product_dir(product_id))?;

        let mut taken = HashSet::new();
        let name = unique_file_name(&dir, &mut taken, 0, sanitize_file_name(original_name));
        let path = dir.join(&name);
        std::fs::write(&path, bytes).map_err(|source| AssetError::Write {
            path: path.clone(),
            source,
        })?;

        StoredFileName::new(name).map_err(|_| AssetError::InvalidReference(original_name.into()))
    }

    /// Copy one image file between product directories (product replication).
    pub fn copy_image(
        &self,
        from: ProductId,
        to: ProductId,
        file_name: &str,
    ) -> Result<(), AssetError> {
        self.ensure_dir(self.product_dir(to))?;
        let source = self.image_path(from, file_name);
        let target = self.image_path(to, file_name);
        std::fs::copy(&source, &target).map_err(|e| AssetError::Copy {
            path: source,
            source: e,
        })?;
        Ok(())
    }

    /// Remove one image file. Absence during cleanup is not an error, only
    /// logged.
    pub fn remove_image(&self, product_id: ProductId, file_name: &str) {
        remove_forgiving(&self.image_path(product_id, file_name));
    }

    /// Store uploaded preview video bytes.
    pub fn store_video(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFileName, AssetError> {
        let dir = self.ensure_dir(self.video_root.clone())?;

        let mut taken = HashSet::new();
        let name = unique_file_name(&dir, &mut taken, 0, sanitize_file_name(original_name));
        let path = dir.join(&name);
        std::fs::write(&path, bytes).map_err(|source| AssetError::Write {
            path: path.clone(),
            source,
        })?;

        StoredFileName::new(name).map_err(|_| AssetError::InvalidReference(original_name.into()))
    }

    /// Remove one preview video file, tolerating absence.
    pub fn remove_video(&self, file_name: &str) {
        remove_forgiving(&self.video_path(file_name));
    }

    fn ensure_dir(&self, dir: PathBuf) -> Result<PathBuf, AssetError> {
        std::fs::create_dir_all(&dir).map_err(|source| AssetError::Dir {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }
}

fn remove_forgiving(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("file {} already missing during cleanup", path.display());
        }
        Err(e) => {
            log::error!("failed to remove file {}: {e}", path.display());
        }
    }
}

/// Derive a stored file name from the last path segment of a URL.
fn file_name_from_url(url: &str) -> String {
    let tail = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .rsplit('/')
        .next()
        .unwrap_or_default();
    sanitize_file_name(tail)
}

fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '-'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches(['-', '.']).to_string();
    if sanitized.is_empty() {
        "image".to_string()
    } else {
        sanitized
    }
}

/// Pick a file name free both within this run and on disk; collisions get a
/// numeric prefix derived from the image position.
fn unique_file_name(
    dir: &Path,
    taken: &HashSet<String>,
    position: usize,
    base: String,
) -> String {
    if !taken.contains(&base) && !dir.join(&base).exists() {
        return base;
    }

    let mut n = position + 1;
    loop {
        let candidate = format!("{n}-{base}");
        if !taken.contains(&candidate) && !dir.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// In-memory fetcher: URLs map to bytes, anything absent fails.
    #[derive(Default)]
    pub(crate) struct StubFetcher {
        responses: HashMap<String, Vec<u8>>,
    }

    impl StubFetcher {
        pub(crate) fn with(mut self, url: &str, bytes: &[u8]) -> Self {
            self.responses.insert(url.to_string(), bytes.to_vec());
            self
        }
    }

    impl RemoteFetcher for StubFetcher {
        fn fetch_url(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::EmptyBody(url.to_string()))
        }
    }

    fn store() -> (tempfile::TempDir, AssetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().join("product-images"), dir.path().join("videos"));
        (dir, store)
    }

    fn product_id(id: i32) -> ProductId {
        ProductId::new(id).unwrap()
    }

    #[test]
    fn stores_each_reference_under_the_product_dir() {
        let (_tmp, store) = store();
        let fetcher = StubFetcher::default()
            .with("https://example.com/a.jpg", b"aaa")
            .with("https://example.com/b.jpg", b"bbb");

        let result = store.materialize(
            &fetcher,
            product_id(7),
            &[
                "https://example.com/a.jpg".to_string(),
                "https://example.com/b.jpg".to_string(),
            ],
        );

        assert!(result.failures.is_empty());
        assert_eq!(result.stored.len(), 2);
        assert_eq!(
            std::fs::read(store.image_path(product_id(7), result.stored[0].as_str())).unwrap(),
            b"aaa"
        );
    }

    #[test]
    fn one_failed_image_does_not_stop_the_rest() {
        let (_tmp, store) = store();
        let fetcher = StubFetcher::default().with("https://example.com/b.jpg", b"bbb");

        let result = store.materialize(
            &fetcher,
            product_id(7),
            &[
                "https://example.com/missing.jpg".to_string(),
                "https://example.com/b.jpg".to_string(),
            ],
        );

        assert_eq!(result.stored.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert!(matches!(result.failures[0], AssetError::Download { .. }));
    }

    #[test]
    fn invalid_reference_fails_only_that_image() {
        let (_tmp, store) = store();
        let fetcher = StubFetcher::default().with("https://example.com/b.jpg", b"bbb");

        let result = store.materialize(
            &fetcher,
            product_id(7),
            &[
                "not a url".to_string(),
                "https://example.com/b.jpg".to_string(),
            ],
        );

        assert_eq!(result.stored.len(), 1);
        assert!(matches!(
            result.failures[0],
            AssetError::InvalidReference(_)
        ));
    }

    #[test]
    fn materializing_twice_is_idempotent_on_the_directory() {
        let (_tmp, store) = store();
        let fetcher = StubFetcher::default().with("https://example.com/a.jpg", b"aaa");
        let refs = vec!["https://example.com/a.jpg".to_string()];

        let first = store.materialize(&fetcher, product_id(7), &refs);
        let second = store.materialize(&fetcher, product_id(7), &refs);

        assert!(first.failures.is_empty());
        assert!(second.failures.is_empty());
        // The second run must not overwrite the first file.
        assert_ne!(first.stored[0], second.stored[0]);
    }

    #[test]
    fn same_basename_gets_distinct_names_within_a_run() {
        let (_tmp, store) = store();
        let fetcher = StubFetcher::default()
            .with("https://example.com/x/a.jpg", b"one")
            .with("https://example.com/y/a.jpg", b"two");

        let result = store.materialize(
            &fetcher,
            product_id(3),
            &[
                "https://example.com/x/a.jpg".to_string(),
                "https://example.com/y/a.jpg".to_string(),
            ],
        );

        assert_eq!(result.stored.len(), 2);
        assert_ne!(result.stored[0], result.stored[1]);
    }

    #[test]
    fn removing_a_missing_image_is_tolerated() {
        let (_tmp, store) = store();
        // Nothing stored; must not panic or error.
        store.remove_image(product_id(9), "gone.jpg");
    }
}
