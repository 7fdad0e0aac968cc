//! Local JSON backups of site records
//!
//! Every completed pass writes `<backup-dir>/<site>_dump.json` before the
//! persistence policy is consulted, so a declined or failed commit never
//! loses the crawl result.

use crate::snapshot::SiteRecord;
use crate::WordwatchError;
use std::fs;
use std::path::PathBuf;

/// Writes site records into one directory
#[derive(Debug, Clone)]
pub struct BackupWriter {
    dir: PathBuf,
}

impl BackupWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the backup file for `site`
    pub fn path_for(&self, site: &str) -> PathBuf {
        self.dir.join(format!("{}_dump.json", site))
    }

    /// Writes `record`, replacing any previous backup of the same site
    ///
    /// The JSON goes to a temporary file first and is renamed into place, so
    /// a reader never sees a half-written backup.
    pub fn write(&self, record: &SiteRecord) -> Result<PathBuf, WordwatchError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(&record.name);
        let tmp = self.dir.join(format!(".{}_dump.json.tmp", record.name));

        let json = serde_json::to_string_pretty(record)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        tracing::info!("Backup written to {}", path.display());
        Ok(path)
    }

    /// Reads the backup of `site`, if one exists
    pub fn read(&self, site: &str) -> Result<Option<SiteRecord>, WordwatchError> {
        let path = self.path_for(site);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}
