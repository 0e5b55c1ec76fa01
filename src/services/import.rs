//! Bulk import orchestration.
//!
//! One run fetches the feed, parses it, and then materializes and writes
//! every record before summarizing. Per-record problems are collected into
//! the summary and never abort the batch; only a fetch failure or an
//! unusable feed document ends the run early. Runs over the same feed
//! source are serialized by an in-process lock.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock, PoisonError};

use chrono::Utc;
use thiserror::Error;

use crate::domain::image::NewProductImage;
use crate::domain::import::{ImportRecord, ImportSummary};
use crate::domain::product::NewProduct;
use crate::domain::types::FeedUrl;
use crate::feed::FeedFormat;
use crate::feed::assets::AssetStore;
use crate::feed::fetch::{FeedSource, FetchError, HttpFetcher, RemoteFetcher, fetch_feed};
use crate::feed::parse::{FeedParseError, parse_feed};
use crate::models::config::CatalogConfig;
use crate::repository::{ProductReader, ProductWriter};
use crate::services::products::unique_slug;

/// Errors that abort a whole import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid import configuration: {0}")]
    Config(String),
    #[error("an import of `{0}` is already running")]
    AlreadyRunning(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] FeedParseError),
}

static ACTIVE_RUNS: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

/// Marks one feed source as busy for the lifetime of the guard.
struct RunGuard {
    key: String,
}

impl RunGuard {
    fn acquire(key: &str) -> Option<Self> {
        let mut active = ACTIVE_RUNS
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if active.insert(key.to_string()) {
            Some(Self {
                key: key.to_string(),
            })
        } else {
            None
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(active) = ACTIVE_RUNS.get() {
            active
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.key);
        }
    }
}

/// Run one import end-to-end and report its summary.
///
/// Every record the parser yields is attempted; a failed record is counted
/// and the run continues. When a catalog write fails after image files were
/// already stored, the files are reported as orphaned rather than removed.
pub fn run_import<R, F>(
    source: &FeedSource,
    format: FeedFormat,
    repo: &R,
    fetcher: &F,
    assets: &AssetStore,
) -> Result<ImportSummary, ImportError>
where
    R: ProductReader + ProductWriter,
    F: RemoteFetcher,
{
    let _guard = RunGuard::acquire(&source.key())
        .ok_or_else(|| ImportError::AlreadyRunning(source.key()))?;

    log::info!("starting import of {source}");
    let bytes = fetch_feed(fetcher, source)?;
    let records = parse_feed(&bytes, format)?;

    let mut summary = ImportSummary::default();
    for (index, outcome) in records.enumerate() {
        summary.total += 1;
        match outcome {
            Ok(record) => import_record(index, record, repo, fetcher, assets, &mut summary),
            Err(e) => {
                log::warn!("skipping record {index}: {e}");
                summary.record_skipped(index, e.to_string());
            }
        }
    }

    log::info!(
        "import of {source} finished: {} succeeded, {} skipped, {} failed",
        summary.succeeded,
        summary.skipped,
        summary.failed,
    );
    if !summary.orphaned_files.is_empty() {
        log::warn!(
            "import of {source} left {} orphaned file(s) needing cleanup",
            summary.orphaned_files.len()
        );
    }

    Ok(summary)
}

/// Import the configured remote XML feed.
///
/// Convenience wrapper used by the admin action: builds the fetcher and
/// asset store from [`CatalogConfig`] and runs [`run_import`].
pub fn run_configured_import<R>(
    config: &CatalogConfig,
    repo: &R,
) -> Result<ImportSummary, ImportError>
where
    R: ProductReader + ProductWriter,
{
    let url = FeedUrl::new(config.feed_url.as_str()).map_err(|e| ImportError::Config(e.to_string()))?;
    let fetcher = HttpFetcher::new(config.fetch_timeout)?;
    let assets = AssetStore::new(&config.image_root, &config.video_root);

    run_import(&FeedSource::Url(url), FeedFormat::Xml, repo, &fetcher, &assets)
}

/// Attempt one record: insert the product, then materialize and record its
/// images. Failures past the product insert degrade the record, never the
/// run.
fn import_record<R, F>(
    index: usize,
    record: ImportRecord,
    repo: &R,
    fetcher: &F,
    assets: &AssetStore,
    summary: &mut ImportSummary,
) where
    R: ProductReader + ProductWriter,
    F: RemoteFetcher,
{
    let title = record.title.as_str().to_string();

    let slug = match unique_slug(repo, &title, None) {
        Ok(slug) => slug,
        Err(e) => {
            log::error!("record {index}: failed to derive slug: {e}");
            summary.record_failed(index, title, e.to_string());
            return;
        }
    };

    let new_product = NewProduct::from_import_record(&record, slug, Utc::now().naive_utc());
    let product = match repo.create_product(&new_product, &[], &[]) {
        Ok(product) => product,
        Err(e) => {
            log::error!("record {index}: failed to create product: {e}");
            summary.record_failed(index, title, e.to_string());
            return;
        }
    };

    let materialized = assets.materialize(fetcher, product.id, &record.images);
    for failure in &materialized.failures {
        log::warn!("record {index}: {failure}");
        summary.record_issue(index, title.as_str(), failure.to_string());
    }

    for (position, file_name) in materialized.stored.iter().enumerate() {
        let image = NewProductImage {
            file_name: file_name.clone(),
            is_cover: position == 0,
        };
        if let Err(e) = repo.add_product_image(product.id, &image) {
            let path = assets.image_path(product.id, file_name.as_str());
            log::warn!(
                "record {index}: image row failed, {} left orphaned: {e}",
                path.display()
            );
            summary.record_issue(
                index,
                title.as_str(),
                format!("image `{file_name}` not recorded: {e}"),
            );
            summary.record_orphan(path);
        }
    }

    summary.succeeded += 1;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;
    use crate::domain::types::FeedUrl;
    use crate::repository::test::TestRepository;
    use crate::repository::{ProductListQuery, ProductReader};

    /// Each test gets its own feed URL so the global run lock never
    /// contends across concurrently running tests.
    fn feed(name: &str) -> (String, FeedSource) {
        let url = format!("https://feeds.example.com/{name}.xml");
        let source = FeedSource::Url(FeedUrl::new(url.as_str()).unwrap());
        (url, source)
    }

    #[derive(Default)]
    struct StubFetcher {
        responses: HashMap<String, Vec<u8>>,
    }

    impl StubFetcher {
        fn with(mut self, url: &str, bytes: &[u8]) -> Self {
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

    fn asset_store() -> (tempfile::TempDir, AssetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().join("product-images"), dir.path().join("videos"));
        (dir, store)
    }

    const TWO_KAZAK_FEED: &str = r#"<Urunler>
  <Urun>
    <Baslik>Kırmızı Kazak</Baslik>
    <Fiyat>100</Fiyat>
    <Resimler><Resim>https://example.com/a.jpg</Resim></Resimler>
  </Urun>
  <Urun>
    <Baslik>Kırmızı Kazak</Baslik>
    <Fiyat>120</Fiyat>
    <Resimler/>
  </Urun>
</Urunler>"#;

    #[test]
    fn imports_every_well_formed_record() {
        let repo = TestRepository::new();
        let (_tmp, assets) = asset_store();
        let (url, source) = feed("kazaklar");
        let fetcher = StubFetcher::default()
            .with(&url, TWO_KAZAK_FEED.as_bytes())
            .with("https://example.com/a.jpg", b"jpg-bytes");

        let summary = run_import(&source, FeedFormat::Xml, &repo, &fetcher, &assets).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.skipped, 0);
        assert!(summary.orphaned_files.is_empty());

        let (_, products) = repo.list_products(ProductListQuery::default()).unwrap();
        assert_eq!(products.len(), 2);

        let mut slugs: Vec<&str> = products.iter().map(|p| p.slug.as_str()).collect();
        slugs.sort();
        assert_eq!(slugs, vec!["kirmizi-kazak", "kirmizi-kazak-2"]);

        // One image row for the first record, none for the second.
        let first = products
            .iter()
            .find(|p| p.slug.as_str() == "kirmizi-kazak")
            .unwrap();
        let second = products
            .iter()
            .find(|p| p.slug.as_str() == "kirmizi-kazak-2")
            .unwrap();
        let first_images = repo.list_product_images(first.id).unwrap();
        assert_eq!(first_images.len(), 1);
        assert!(first_images[0].is_cover);
        assert!(repo.list_product_images(second.id).unwrap().is_empty());

        // Imports force safe defaults.
        assert!(first.status);
        assert!(!first.homepage_visible);
        assert!(first.brand_id.is_none());
    }

    #[test]
    fn malformed_record_is_skipped_without_a_product() {
        let repo = TestRepository::new();
        let (_tmp, assets) = asset_store();
        let body = r#"<Urunler>
  <Urun><Fiyat>10</Fiyat></Urun>
  <Urun><Baslik>Tablo</Baslik><Fiyat>20</Fiyat><Resimler/></Urun>
</Urunler>"#;
        let (url, source) = feed("malformed");
        let fetcher = StubFetcher::default().with(&url, body.as_bytes());

        let summary = run_import(&source, FeedFormat::Xml, &repo, &fetcher, &assets).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(repo.product_count(), 1);
        assert!(summary.issues[0].message.contains("Baslik"));
    }

    #[test]
    fn failed_image_still_creates_the_product() {
        let repo = TestRepository::new();
        let (_tmp, assets) = asset_store();
        let body = r#"<Urunler>
  <Urun>
    <Baslik>Tablo</Baslik>
    <Fiyat>10</Fiyat>
    <Resimler>
      <Resim>https://example.com/ok.jpg</Resim>
      <Resim>https://example.com/broken.jpg</Resim>
    </Resimler>
  </Urun>
</Urunler>"#;
        let (url, source) = feed("broken-image");
        let fetcher = StubFetcher::default()
            .with(&url, body.as_bytes())
            .with("https://example.com/ok.jpg", b"ok");

        let summary = run_import(&source, FeedFormat::Xml, &repo, &fetcher, &assets).unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.issues.len(), 1);

        let (_, products) = repo.list_products(ProductListQuery::default()).unwrap();
        assert_eq!(repo.list_product_images(products[0].id).unwrap().len(), 1);
    }

    #[test]
    fn failed_image_row_reports_the_file_as_orphaned() {
        let repo = TestRepository::new();
        let (_tmp, assets) = asset_store();
        let body = r#"<Urunler>
  <Urun>
    <Baslik>Tablo</Baslik>
    <Fiyat>10</Fiyat>
    <Resimler><Resim>https://example.com/a.jpg</Resim></Resimler>
  </Urun>
</Urunler>"#;
        let (url, source) = feed("orphaned");
        let fetcher = StubFetcher::default()
            .with(&url, body.as_bytes())
            .with("https://example.com/a.jpg", b"jpg");
        repo.fail_image_inserts();

        let summary = run_import(&source, FeedFormat::Xml, &repo, &fetcher, &assets).unwrap();

        // The product stays; the stored file is flagged for cleanup.
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.orphaned_files.len(), 1);
        assert!(summary.orphaned_files[0].exists());
        assert_eq!(repo.image_count(), 0);
    }

    #[test]
    fn spreadsheet_upload_skips_only_the_first_row() {
        let repo = TestRepository::new();
        let (_tmp, assets) = asset_store();

        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        // The first row is a plausible data row; it must be skipped anyway.
        write!(file, "Mavi Atkı,yün,45,30,5\nKırmızı Kazak,kazak,100,80,3\n").unwrap();

        let fetcher = StubFetcher::default();
        let source = FeedSource::File(file.path().to_path_buf());
        let summary = run_import(&source, FeedFormat::Csv, &repo, &fetcher, &assets).unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.succeeded, 1);

        let (_, products) = repo.list_products(ProductListQuery::default()).unwrap();
        assert_eq!(products[0].name.as_str(), "Kırmızı Kazak");
        assert_eq!(products[0].stock.get(), 3);
    }

    #[test]
    fn concurrent_run_of_the_same_source_is_rejected() {
        let repo = TestRepository::new();
        let (_tmp, assets) = asset_store();
        let fetcher = StubFetcher::default();
        let source = FeedSource::File("/feeds/locked.xml".into());

        let _guard = RunGuard::acquire(&source.key()).unwrap();

        let err =
            run_import(&source, FeedFormat::Xml, &repo, &fetcher, &assets).unwrap_err();
        assert!(matches!(err, ImportError::AlreadyRunning(_)));
    }

    #[test]
    fn sequential_runs_keep_slugs_globally_unique() {
        let repo = TestRepository::new();
        let (_tmp, assets) = asset_store();
        let body = "<Urunler><Urun><Baslik>Tablo</Baslik><Fiyat>10</Fiyat><Resimler/></Urun></Urunler>";
        let (url, source) = feed("sequential");
        let fetcher = StubFetcher::default().with(&url, body.as_bytes());

        run_import(&source, FeedFormat::Xml, &repo, &fetcher, &assets).unwrap();
        run_import(&source, FeedFormat::Xml, &repo, &fetcher, &assets).unwrap();

        let (_, products) = repo.list_products(ProductListQuery::default()).unwrap();
        let mut slugs: Vec<&str> = products.iter().map(|p| p.slug.as_str()).collect();
        slugs.sort();
        assert_eq!(slugs, vec!["tablo", "tablo-2"]);
    }

    #[test]
    fn rejects_an_invalid_configured_feed_url() {
        let repo = TestRepository::new();
        let config = CatalogConfig {
            image_root: "/var/lib/pazar/product-images".into(),
            video_root: "/var/lib/pazar/videos".into(),
            feed_url: "not-a-url".into(),
            fetch_timeout: std::time::Duration::from_secs(5),
        };

        let err = run_configured_import(&config, &repo).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }

    #[test]
    fn empty_feed_aborts_the_run() {
        let repo = TestRepository::new();
        let (_tmp, assets) = asset_store();
        let (url, source) = feed("empty");
        let fetcher = StubFetcher::default().with(&url, b"<Urunler></Urunler>");

        let err = run_import(&source, FeedFormat::Xml, &repo, &fetcher, &assets).unwrap_err();
        assert!(matches!(err, ImportError::Parse(FeedParseError::Empty)));
        assert_eq!(repo.product_count(), 0);
    }
}
