//! Storage traits and error types
//!
//! This module defines the trait interfaces for storage backends and
//! associated error types.

use crate::snapshot::{CrawlSnapshot, SiteRecord};
use crate::storage::{RunRecord, RunStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Site already exists: {0}")]
    SiteExists(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid timestamp in database: {0}")]
    Timestamp(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only store of per-site snapshot histories
///
/// This is the only way the crawler reaches persistent state. A site record
/// is created once and then only grows; `updated_at` never moves backwards.
pub trait SnapshotStore {
    /// Returns true if a record for `site` exists
    fn exists(&self, site: &str) -> StorageResult<bool>;

    /// Creates a record together with the snapshots it already holds
    ///
    /// The site row and its history are written in one transaction. Fails
    /// with [`StorageError::SiteExists`] if the site is already stored.
    fn create(&mut self, record: &SiteRecord) -> StorageResult<()>;

    /// Appends a snapshot and advances `updated_at` to `at`
    ///
    /// Both happen in one transaction; a failure leaves the record unchanged.
    fn append_snapshot(
        &mut self,
        site: &str,
        snapshot: &CrawlSnapshot,
        at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Time of the last committed snapshot, or None for an unknown site
    fn get_updated_at(&self, site: &str) -> StorageResult<Option<DateTime<Utc>>>;

    /// Loads the full history of a site
    fn load_record(&self, site: &str) -> StorageResult<Option<SiteRecord>>;

    /// Names of all stored sites, sorted
    fn list_sites(&self) -> StorageResult<Vec<String>>;
}

/// Bookkeeping of crawl runs
pub trait RunLog {
    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as finished with the given status
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;
}
