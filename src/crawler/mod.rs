//! Crawler module for site fetching and word counting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Article block parsing and link discovery
//! - Term counting
//! - Freshness gating and per-host politeness
//! - Overall crawl coordination

mod coordinator;
mod counter;
mod fetcher;
mod parser;
mod scheduler;
mod site_crawler;

pub use coordinator::{Coordinator, RunReport, SiteOutcome, SiteReport};
pub use counter::{count_words, tokenize, WordDictionary};
pub use fetcher::{
    build_http_client, Document, FetchError, Fetcher, HttpTransport, RawResponse, RetryPolicy,
    Transport, TransportError,
};
pub use parser::{
    article_page_text, summarize_front_page, ArticleBlock, BlockSummary, FrontPage,
    ParsedDocument, NO_TITLE,
};
pub use scheduler::{PolitenessThrottle, ScheduleGuard};
pub use site_crawler::{CrawlOptions, SiteCrawler};

use crate::config::{resolve_sites, Config};
use crate::output::PersistDecider;
use crate::storage::SqliteStorage;
use crate::Result;
use std::path::Path;

/// Runs a complete crawl pass with the real HTTP transport and database
///
/// This is the main entry point for a crawl. It will:
/// 1. Open the database named in the configuration
/// 2. Build the HTTP client
/// 3. Resolve the configured sites
/// 4. Crawl every due site and persist under `persist`
pub async fn crawl(config: Config, config_hash: &str, persist: PersistDecider) -> Result<RunReport> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let transport = HttpTransport::from_config(&config.user_agent, &config.crawler)?;
    let sites = resolve_sites(&config);

    let mut coordinator = Coordinator::from_config(&config, transport, storage, persist);
    Ok(coordinator.run(sites, config_hash).await)
}
