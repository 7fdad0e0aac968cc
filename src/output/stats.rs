//! Statistics over stored site histories
//!
//! This module provides functionality for extracting and displaying
//! per-site history summaries from the storage layer.

use crate::crawler::WordDictionary;
use crate::storage::{SnapshotStore, StorageResult};
use chrono::{DateTime, Utc};

/// Summary of one site's stored history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteHistoryStats {
    pub name: String,
    pub url: String,

    /// Number of stored snapshots
    pub snapshots: usize,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Article totals of the most recent snapshot
    pub latest_article_totals: Option<WordDictionary>,
}

/// Loads a summary for every stored site
pub fn load_statistics(store: &dyn SnapshotStore) -> StorageResult<Vec<SiteHistoryStats>> {
    let mut stats = Vec::new();

    for name in store.list_sites()? {
        let Some(record) = store.load_record(&name)? else {
            continue;
        };

        stats.push(SiteHistoryStats {
            latest_article_totals: record
                .latest()
                .map(|snapshot| snapshot.main_page_articles.total_words.clone()),
            snapshots: record.data.len(),
            name: record.name,
            url: record.url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        });
    }

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &[SiteHistoryStats]) {
    println!("=== Site History ===\n");

    if stats.is_empty() {
        println!("No sites stored yet");
        return;
    }

    for site in stats {
        println!("{} ({})", site.name, site.url);
        println!("  Snapshots: {}", site.snapshots);
        println!("  First seen: {}", site.created_at.to_rfc3339());
        println!("  Last updated: {}", site.updated_at.to_rfc3339());

        if let Some(totals) = &site.latest_article_totals {
            println!("  Latest article totals:");
            let mut counts: Vec<_> = totals.iter().collect();
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            for (term, count) in counts {
                println!("    {}: {}", term, count);
            }
        }
        println!();
    }

    let total: usize = stats.iter().map(|s| s.snapshots).sum();
    println!("Total: {} sites, {} snapshots", stats.len(), total);
}
