//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main run loop that coordinates one pass over
//! every configured site, including:
//! - Recording the run and its configuration hash
//! - Gating each site with the freshness guard
//! - Crawling due sites one after another
//! - Writing backups and committing snapshots under the persistence policy
//! - Reporting a per-site outcome at the end of the run

use crate::config::{Config, Site};
use crate::crawler::fetcher::Transport;
use crate::crawler::scheduler::ScheduleGuard;
use crate::crawler::site_crawler::SiteCrawler;
use crate::output::{BackupWriter, PersistDecider};
use crate::snapshot::{CrawlSnapshot, SiteRecord};
use crate::state::{CrawlPass, CrawlState};
use crate::storage::{RunLog, RunStatus, SnapshotStore};
use crate::{ConfigError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// What happened to one site during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteOutcome {
    /// A snapshot was produced
    Completed {
        /// Whether the snapshot was committed to the store
        persisted: bool,

        /// Number of articles counted
        articles: usize,

        /// Backup file, if it could be written
        backup: Option<PathBuf>,
    },

    /// The site was crawled too recently
    Skipped { next_eligible: DateTime<Utc> },

    /// The pass was abandoned
    Failed { error: String },

    /// The configuration entry could not be resolved
    Invalid { error: String },
}

impl fmt::Display for SiteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed {
                persisted, articles, ..
            } => write!(
                f,
                "completed, {} articles, {}",
                articles,
                if *persisted { "persisted" } else { "not persisted" }
            ),
            Self::Skipped { next_eligible } => {
                write!(f, "skipped until {}", next_eligible.to_rfc3339())
            }
            Self::Failed { error } => write!(f, "failed: {}", error),
            Self::Invalid { error } => write!(f, "invalid: {}", error),
        }
    }
}

/// Outcome of one site, labelled with the site name or entry number
#[derive(Debug, Clone)]
pub struct SiteReport {
    pub site: String,
    pub outcome: SiteOutcome,
}

/// Result of a full run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub run_id: Option<i64>,
    pub sites: Vec<SiteReport>,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, SiteOutcome::Completed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SiteOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SiteOutcome::Failed { .. } | SiteOutcome::Invalid { .. }))
    }

    pub fn outcome(&self, site: &str) -> Option<&SiteOutcome> {
        self.sites
            .iter()
            .find(|report| report.site == site)
            .map(|report| &report.outcome)
    }

    fn count(&self, predicate: impl Fn(&SiteOutcome) -> bool) -> usize {
        self.sites.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<T, S> {
    crawler: SiteCrawler<T>,
    store: S,
    guard: ScheduleGuard,
    backup: BackupWriter,
    persist: PersistDecider,
}

impl<T, S> Coordinator<T, S>
where
    T: Transport,
    S: SnapshotStore + RunLog,
{
    pub fn new(
        crawler: SiteCrawler<T>,
        store: S,
        guard: ScheduleGuard,
        backup: BackupWriter,
        persist: PersistDecider,
    ) -> Self {
        Self {
            crawler,
            store,
            guard,
            backup,
            persist,
        }
    }

    /// Wires a coordinator from the configuration
    pub fn from_config(config: &Config, transport: T, store: S, persist: PersistDecider) -> Self {
        Self::new(
            SiteCrawler::from_config(transport, &config.crawler),
            store,
            ScheduleGuard::from_config(&config.crawler),
            BackupWriter::new(&config.output.backup_dir),
            persist,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one pass over every site entry
    ///
    /// Sites are processed one after another. No site-scoped error ends the
    /// run; every entry gets an outcome in the report.
    pub async fn run(
        &mut self,
        sites: Vec<std::result::Result<Site, ConfigError>>,
        config_hash: &str,
    ) -> RunReport {
        let run_id = match self.store.create_run(config_hash) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Could not record run: {}", e);
                None
            }
        };

        let total = sites.len();
        let start_time = std::time::Instant::now();
        tracing::info!("Starting crawl run over {} sites", total);

        let mut report = RunReport {
            run_id,
            sites: Vec::with_capacity(total),
        };

        for (index, entry) in sites.into_iter().enumerate() {
            let site_report = match entry {
                Ok(site) => {
                    tracing::info!("[{}/{}] {}", index + 1, total, site.describe());
                    let outcome = self.process_site(&site).await;
                    SiteReport {
                        site: site.name,
                        outcome,
                    }
                }
                Err(e) => {
                    tracing::warn!("[{}/{}] skipping invalid site entry: {}", index + 1, total, e);
                    SiteReport {
                        site: format!("entry #{}", index),
                        outcome: SiteOutcome::Invalid {
                            error: e.to_string(),
                        },
                    }
                }
            };
            report.sites.push(site_report);
        }

        // A run in which no entry got anywhere is recorded as failed
        let status = if !report.sites.is_empty() && report.failed() == report.sites.len() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        if let Some(id) = run_id {
            if let Err(e) = self.store.finish_run(id, status) {
                tracing::warn!("Could not complete run {}: {}", id, e);
            }
        }

        tracing::info!(
            "Run finished in {:.1}s: {} completed, {} skipped, {} failed",
            start_time.elapsed().as_secs_f64(),
            report.completed(),
            report.skipped(),
            report.failed()
        );

        report
    }

    /// Runs the full pass for one site and reports its outcome
    pub async fn process_site(&mut self, site: &Site) -> SiteOutcome {
        let mut pass = CrawlPass::new(&site.name);

        match self.try_process_site(site, &mut pass).await {
            Ok(outcome) => outcome,
            Err(e) => {
                pass.fail();
                tracing::error!("{}: {}", site.name, e);
                SiteOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn try_process_site(&mut self, site: &Site, pass: &mut CrawlPass) -> Result<SiteOutcome> {
        pass.advance(CrawlState::Guarded)?;

        let now = Utc::now();
        let updated_at = self.store.get_updated_at(&site.name)?;
        match updated_at {
            Some(last) if !self.guard.is_due(updated_at, now) => {
                let next_eligible = self.guard.next_eligible(last);
                pass.advance(CrawlState::Skipped)?;
                tracing::info!(
                    "{}: last crawled {}, not due before {}",
                    site.name,
                    last.to_rfc3339(),
                    next_eligible.to_rfc3339()
                );
                return Ok(SiteOutcome::Skipped { next_eligible });
            }
            _ => {}
        }

        let snapshot = self.crawler.crawl(site, now, pass).await?;
        let articles = snapshot.main_page_articles.total_articles;
        let committed_at = Utc::now();

        let backup = self.write_backup(site, &snapshot, committed_at);

        let persisted = self.persist.should_persist(&site.name);
        if persisted {
            self.commit(site, &snapshot, committed_at)?;
            tracing::info!("{}: snapshot committed", site.name);
        } else {
            tracing::info!("{}: snapshot not persisted", site.name);
        }

        pass.advance(CrawlState::Done)?;
        Ok(SiteOutcome::Completed {
            persisted,
            articles,
            backup,
        })
    }

    /// Writes the stored history plus `snapshot` to the backup directory
    ///
    /// Falls back to the previous backup when the store has no record, so
    /// runs that never persist still accumulate history on disk.
    fn write_backup(
        &self,
        site: &Site,
        snapshot: &CrawlSnapshot,
        at: DateTime<Utc>,
    ) -> Option<PathBuf> {
        let stored = match self.store.load_record(&site.name) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("{}: could not load stored history: {}", site.name, e);
                None
            }
        };

        let mut record = stored
            .or_else(|| self.backup.read(&site.name).ok().flatten())
            .unwrap_or_else(|| SiteRecord::new(&site.name, &site.url, at));
        record.append(snapshot.clone(), at);

        match self.backup.write(&record) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!("{}: backup failed: {}", site.name, e);
                None
            }
        }
    }

    /// Commits `snapshot` in a single store call
    ///
    /// A new site is created together with its first snapshot, so a failed
    /// commit never leaves a record whose `updated_at` moved without data.
    fn commit(&mut self, site: &Site, snapshot: &CrawlSnapshot, at: DateTime<Utc>) -> Result<()> {
        if self.store.exists(&site.name)? {
            self.store.append_snapshot(&site.name, snapshot, at)?;
        } else {
            let mut record = SiteRecord::new(&site.name, &site.url, at);
            record.append(snapshot.clone(), at);
            self.store.create(&record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::crawler::fetcher::{RawResponse, TransportError};
    use crate::storage::{RunRecord, SqliteStorage, StorageError, StorageResult};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Serves one front page with a single linked article
    struct OneArticleSite {
        requests: AtomicUsize,
    }

    #[async_trait]
    impl Transport for OneArticleSite {
        async fn get(&self, url: &str) -> std::result::Result<RawResponse, TransportError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let body = if url.ends_with("/a.html") {
                "<article>corona</article>"
            } else {
                r#"<article><a href="/a.html" title="A">trump</a></article>"#
            };
            Ok(RawResponse {
                status_code: 200,
                final_url: url.to_string(),
                body: body.to_string(),
            })
        }
    }

    fn site() -> Site {
        Site {
            name: "news".to_string(),
            url: "https://news.example".to_string(),
            search_terms: vec!["corona".to_string(), "trump".to_string()],
            title_attribute: "title".to_string(),
        }
    }

    /// SQLite store whose appends always fail
    struct RejectingAppends {
        inner: SqliteStorage,
        appends: usize,
    }

    impl SnapshotStore for RejectingAppends {
        fn exists(&self, site: &str) -> StorageResult<bool> {
            self.inner.exists(site)
        }

        fn create(&mut self, record: &SiteRecord) -> StorageResult<()> {
            self.inner.create(record)
        }

        fn append_snapshot(
            &mut self,
            site: &str,
            _snapshot: &CrawlSnapshot,
            _at: DateTime<Utc>,
        ) -> StorageResult<()> {
            self.appends += 1;
            Err(StorageError::SiteNotFound(site.to_string()))
        }

        fn get_updated_at(&self, site: &str) -> StorageResult<Option<DateTime<Utc>>> {
            self.inner.get_updated_at(site)
        }

        fn load_record(&self, site: &str) -> StorageResult<Option<SiteRecord>> {
            self.inner.load_record(site)
        }

        fn list_sites(&self) -> StorageResult<Vec<String>> {
            self.inner.list_sites()
        }
    }

    impl RunLog for RejectingAppends {
        fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
            self.inner.create_run(config_hash)
        }

        fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
            self.inner.get_run(run_id)
        }

        fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
            self.inner.get_latest_run()
        }

        fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
            self.inner.finish_run(run_id, status)
        }
    }

    fn coordinator(
        backup_dir: &TempDir,
        persist: PersistDecider,
    ) -> Coordinator<OneArticleSite, SqliteStorage> {
        coordinator_with_store(
            backup_dir,
            SqliteStorage::open_in_memory().unwrap(),
            persist,
        )
    }

    fn coordinator_with_store<S: SnapshotStore + RunLog>(
        backup_dir: &TempDir,
        store: S,
        persist: PersistDecider,
    ) -> Coordinator<OneArticleSite, S> {
        let config = CrawlerConfig {
            politeness_delay_ms: 0,
            ..CrawlerConfig::default()
        };
        Coordinator::new(
            SiteCrawler::from_config(
                OneArticleSite {
                    requests: AtomicUsize::new(0),
                },
                &config,
            ),
            store,
            ScheduleGuard::from_config(&config),
            BackupWriter::new(backup_dir.path()),
            persist,
        )
    }

    #[tokio::test]
    async fn test_site_is_committed_then_skipped() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir, PersistDecider::always());

        let first = coordinator.process_site(&site()).await;
        assert!(matches!(
            first,
            SiteOutcome::Completed {
                persisted: true,
                articles: 1,
                backup: Some(_)
            }
        ));

        let second = coordinator.process_site(&site()).await;
        assert!(matches!(second, SiteOutcome::Skipped { .. }));

        let record = coordinator.store().load_record("news").unwrap().unwrap();
        assert_eq!(record.data.len(), 1);
    }

    #[tokio::test]
    async fn test_never_policy_only_writes_backup() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir, PersistDecider::never());

        coordinator.process_site(&site()).await;
        coordinator.process_site(&site()).await;

        assert!(!coordinator.store().exists("news").unwrap());

        let backup = BackupWriter::new(dir.path()).read("news").unwrap().unwrap();
        assert_eq!(backup.data.len(), 2);
    }

    #[tokio::test]
    async fn test_run_reports_invalid_entries_and_continues() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir, PersistDecider::always());

        let sites = vec![
            Err(ConfigError::Site {
                index: 0,
                message: "missing url".to_string(),
            }),
            Ok(site()),
        ];
        let report = coordinator.run(sites, "hash").await;

        assert_eq!(report.sites.len(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.completed(), 1);
        assert!(matches!(report.outcome("entry #0"), Some(SiteOutcome::Invalid { .. })));

        let run = coordinator
            .store()
            .get_run(report.run_id.unwrap())
            .unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.config_hash, "hash");
    }

    #[tokio::test]
    async fn test_new_site_is_created_with_its_first_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = RejectingAppends {
            inner: SqliteStorage::open_in_memory().unwrap(),
            appends: 0,
        };
        let mut coordinator = coordinator_with_store(&dir, store, PersistDecider::always());

        let outcome = coordinator.process_site(&site()).await;
        assert!(matches!(
            outcome,
            SiteOutcome::Completed {
                persisted: true,
                ..
            }
        ));

        assert_eq!(coordinator.store().appends, 0);
        let record = coordinator.store().load_record("news").unwrap().unwrap();
        assert_eq!(record.data.len(), 1);
        assert_eq!(record.data[0].main_page_articles.total_articles, 1);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_updated_at_alone() {
        let dir = TempDir::new().unwrap();
        let stale = Utc::now() - Duration::hours(4);
        let mut inner = SqliteStorage::open_in_memory().unwrap();
        inner
            .create(&SiteRecord::new("news", "https://news.example", stale))
            .unwrap();
        let store = RejectingAppends { inner, appends: 0 };
        let mut coordinator = coordinator_with_store(&dir, store, PersistDecider::always());

        let first = coordinator.process_site(&site()).await;
        assert!(matches!(first, SiteOutcome::Failed { .. }));
        assert_eq!(
            coordinator.store().get_updated_at("news").unwrap(),
            Some(stale)
        );

        // Still due: the guard does not hold back a site whose commit failed
        let second = coordinator.process_site(&site()).await;
        assert!(matches!(second, SiteOutcome::Failed { .. }));
        assert_eq!(coordinator.store().appends, 2);
        assert!(coordinator
            .store()
            .load_record("news")
            .unwrap()
            .unwrap()
            .data
            .is_empty());
    }

    #[tokio::test]
    async fn test_run_where_every_entry_fails_is_marked_failed() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir, PersistDecider::always());

        let sites = vec![Err(ConfigError::Site {
            index: 0,
            message: "missing url".to_string(),
        })];
        let report = coordinator.run(sites, "hash").await;

        let run = coordinator
            .store()
            .get_run(report.run_id.unwrap())
            .unwrap();
        assert_eq!(run.status, RunStatus::Failed);
    }

    #[test]
    fn test_outcome_display() {
        let outcome = SiteOutcome::Completed {
            persisted: false,
            articles: 3,
            backup: None,
        };
        assert_eq!(outcome.to_string(), "completed, 3 articles, not persisted");
    }
}
