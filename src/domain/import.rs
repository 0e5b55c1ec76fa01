use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::types::{ProductDescription, ProductName, ProductPrice, StockCount};

/// Normalized in-memory representation of one feed row.
///
/// Transient: exists only during one import run and is mapped into catalog
/// entities, never persisted directly. Image references are kept raw; a
/// reference that turns out to be unusable fails only that image during
/// materialization, not the record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportRecord {
    pub title: ProductName,
    pub description: Option<ProductDescription>,
    pub price: ProductPrice,
    pub discount_price: Option<ProductPrice>,
    pub stock: StockCount,
    pub images: Vec<String>,
}

/// One reportable problem encountered during an import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportIssue {
    /// Zero-based record index within the feed.
    pub record: usize,
    pub title: Option<String>,
    pub message: String,
}

/// Aggregated outcome of one import run; the sole error surface of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    /// Records the parser yielded, well-formed or not.
    pub total: usize,
    pub succeeded: usize,
    /// Malformed records skipped at parse time.
    pub skipped: usize,
    /// Records whose catalog write failed.
    pub failed: usize,
    pub issues: Vec<ImportIssue>,
    /// Files written for a record whose catalog write later failed; left on
    /// disk for operator cleanup.
    pub orphaned_files: Vec<PathBuf>,
}

impl ImportSummary {
    pub fn record_skipped(&mut self, record: usize, message: impl Into<String>) {
        self.skipped += 1;
        self.issues.push(ImportIssue {
            record,
            title: None,
            message: message.into(),
        });
    }

    pub fn record_failed(
        &mut self,
        record: usize,
        title: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.failed += 1;
        self.issues.push(ImportIssue {
            record,
            title: Some(title.into()),
            message: message.into(),
        });
    }

    /// Notes a non-fatal problem (e.g. one failed image) without changing
    /// the record counts.
    pub fn record_issue(
        &mut self,
        record: usize,
        title: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.issues.push(ImportIssue {
            record,
            title: Some(title.into()),
            message: message.into(),
        });
    }

    pub fn record_orphan(&mut self, path: PathBuf) {
        self.orphaned_files.push(path);
    }
}
