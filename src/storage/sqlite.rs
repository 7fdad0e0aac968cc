//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.
//! Timestamps are stored as RFC 3339 text and snapshots as JSON payloads.

use crate::snapshot::{CrawlSnapshot, SiteRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RunLog, SnapshotStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Number of snapshots stored for `site`
    pub fn count_snapshots(&self, site: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM snapshots WHERE site_name = ?1",
            params![site],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339()
}

fn parse_db_time(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StorageError::Timestamp(value.to_string()))
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

impl SnapshotStore for SqliteStorage {
    fn exists(&self, site: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM sites WHERE name = ?1", params![site], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn create(&mut self, record: &SiteRecord) -> StorageResult<()> {
        if self.exists(&record.name)? {
            return Err(StorageError::SiteExists(record.name.clone()));
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO sites (name, url, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.name,
                record.url,
                to_db_time(&record.created_at),
                to_db_time(&record.updated_at)
            ],
        )?;
        for snapshot in &record.data {
            tx.execute(
                "INSERT INTO snapshots (site_name, created_at, payload) VALUES (?1, ?2, ?3)",
                params![
                    record.name,
                    to_db_time(&snapshot.created_at),
                    serde_json::to_string(snapshot)?
                ],
            )?;
        }
        tx.commit()?;

        tracing::debug!("Created site record {}", record.name);
        Ok(())
    }

    fn append_snapshot(
        &mut self,
        site: &str,
        snapshot: &CrawlSnapshot,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let payload = serde_json::to_string(snapshot)?;
        let tx = self.conn.transaction()?;

        let current: Option<String> = tx
            .query_row(
                "SELECT updated_at FROM sites WHERE name = ?1",
                params![site],
                |row| row.get(0),
            )
            .optional()?;
        let current = match current {
            Some(value) => parse_db_time(&value)?,
            None => return Err(StorageError::SiteNotFound(site.to_string())),
        };

        tx.execute(
            "INSERT INTO snapshots (site_name, created_at, payload) VALUES (?1, ?2, ?3)",
            params![site, to_db_time(&snapshot.created_at), payload],
        )?;

        let updated_at = current.max(at);
        tx.execute(
            "UPDATE sites SET updated_at = ?1 WHERE name = ?2",
            params![to_db_time(&updated_at), site],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get_updated_at(&self, site: &str) -> StorageResult<Option<DateTime<Utc>>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM sites WHERE name = ?1",
                params![site],
                |row| row.get(0),
            )
            .optional()?;

        value.as_deref().map(parse_db_time).transpose()
    }

    fn load_record(&self, site: &str) -> StorageResult<Option<SiteRecord>> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT url, created_at, updated_at FROM sites WHERE name = ?1",
                params![site],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((url, created_at, updated_at)) = row else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM snapshots WHERE site_name = ?1 ORDER BY id")?;
        let payloads = stmt
            .query_map(params![site], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let data = payloads
            .iter()
            .map(|payload| serde_json::from_str(payload))
            .collect::<Result<Vec<CrawlSnapshot>, _>>()?;

        Ok(Some(SiteRecord {
            name: site.to_string(),
            url,
            created_at: parse_db_time(&created_at)?,
            updated_at: parse_db_time(&updated_at)?,
            data,
        }))
    }

    fn list_sites(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM sites ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

impl RunLog for SqliteStorage {
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}
