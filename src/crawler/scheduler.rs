//! Scheduling rules for when and how fast sites are fetched
//!
//! This module handles:
//! - The freshness guard deciding whether a site is due for a new pass
//! - Per-host politeness spacing between consecutive requests

use crate::config::CrawlerConfig;
use crate::state::HostState;
use crate::url::extract_domain;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Decides whether a site's history is stale enough to crawl again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleGuard {
    min_interval: chrono::Duration,
}

impl ScheduleGuard {
    pub fn new(min_interval: chrono::Duration) -> Self {
        Self { min_interval }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.freshness_window())
    }

    pub fn min_interval(&self) -> chrono::Duration {
        self.min_interval
    }

    /// Returns true when the site may be crawled at `now`
    ///
    /// A site that was never stored is always due. Otherwise the site is due
    /// once `now - updated_at` reaches the window; the boundary itself counts
    /// as due.
    pub fn is_due(&self, updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match updated_at {
            None => true,
            Some(updated_at) => now - updated_at >= self.min_interval,
        }
    }

    /// Earliest moment a site last updated at `updated_at` becomes due
    pub fn next_eligible(&self, updated_at: DateTime<Utc>) -> DateTime<Utc> {
        updated_at + self.min_interval
    }
}

/// Spaces out request starts to the same host
///
/// Each caller reserves the next free start slot for its host under a short
/// lock and then sleeps until that slot outside the lock, so concurrent
/// article fetches against one host start at least `delay` apart.
pub struct PolitenessThrottle {
    delay: Duration,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl PolitenessThrottle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.politeness_delay())
    }

    /// Waits until a request to `url` may start
    pub async fn wait_turn(&self, url: &str) {
        let Some(host) = Url::parse(url).ok().as_ref().and_then(extract_domain) else {
            tracing::debug!("No host for {}, not throttling", url);
            return;
        };

        let slot = {
            let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
            hosts
                .entry(host)
                .or_default()
                .reserve_slot(self.delay, Instant::now())
        };

        tokio::time::sleep_until(slot).await;
    }

    /// Number of requests started against `host` so far
    pub fn request_count(&self, host: &str) -> u32 {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .map(|state| state.request_count)
            .unwrap_or(0)
    }
}
