//! Output module for everything a pass leaves behind outside the store
//!
//! This module handles:
//! - Writing local JSON backups of site records
//! - Deciding whether a snapshot is committed (persistence policy)
//! - Summarizing stored histories for the `--stats` mode

mod backup;
mod persist;
pub mod stats;

pub use backup::BackupWriter;
pub use persist::{parse_answer, Confirm, PersistDecider, PersistPolicy};
pub use stats::{load_statistics, print_statistics, SiteHistoryStats};
