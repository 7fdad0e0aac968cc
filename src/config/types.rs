use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Wordwatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Terms counted on every site that does not override them
    #[serde(rename = "search-terms", default)]
    pub search_terms: Vec<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,

    pub output: OutputConfig,

    #[serde(rename = "site", default)]
    pub sites: Vec<SiteEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum time between two snapshots of the same site (minutes)
    #[serde(rename = "freshness-window-minutes", default = "default_freshness_window")]
    pub freshness_window_minutes: u64,

    /// Minimum time between two requests to the same host (milliseconds)
    #[serde(rename = "politeness-delay-ms", default = "default_politeness_delay")]
    pub politeness_delay_ms: u64,

    /// Maximum number of article pages fetched at once for one site
    #[serde(rename = "max-concurrent-articles", default = "default_max_concurrent_articles")]
    pub max_concurrent_articles: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Delay before retrying after a connection failure (seconds)
    #[serde(rename = "connect-retry-delay-secs", default = "default_connect_retry_delay")]
    pub connect_retry_delay_secs: u64,

    /// Delay before retrying after a read timeout (seconds)
    #[serde(
        rename = "read-timeout-retry-delay-secs",
        default = "default_read_timeout_retry_delay"
    )]
    pub read_timeout_retry_delay_secs: u64,

    /// Whether snapshots carry the per-article listing
    #[serde(rename = "include-articles", default)]
    pub include_articles: bool,
}

fn default_freshness_window() -> u64 {
    180
}

fn default_politeness_delay() -> u64 {
    100
}

fn default_max_concurrent_articles() -> u32 {
    4
}

fn default_request_timeout() -> u64 {
    15
}

fn default_connect_retry_delay() -> u64 {
    5
}

fn default_read_timeout_retry_delay() -> u64 {
    2
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            freshness_window_minutes: default_freshness_window(),
            politeness_delay_ms: default_politeness_delay(),
            max_concurrent_articles: default_max_concurrent_articles(),
            request_timeout_secs: default_request_timeout(),
            connect_retry_delay_secs: default_connect_retry_delay(),
            read_timeout_retry_delay_secs: default_read_timeout_retry_delay(),
            include_articles: false,
        }
    }
}

impl CrawlerConfig {
    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.freshness_window_minutes as i64)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_secs(self.connect_retry_delay_secs)
    }

    pub fn read_timeout_retry_delay(&self) -> Duration {
        Duration::from_secs(self.read_timeout_retry_delay_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory receiving one JSON backup per site
    #[serde(rename = "backup-dir", default = "default_backup_dir")]
    pub backup_dir: String,
}

fn default_backup_dir() -> String {
    "./backup".to_string()
}

/// A `[[site]]` entry as written in the configuration file
///
/// Every field is optional at parse time so that one broken entry does not
/// prevent the others from being crawled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteEntry {
    pub name: Option<String>,

    pub url: Option<String>,

    /// Anchor attribute holding the article title
    #[serde(rename = "title-attribute")]
    pub title_attribute: Option<String>,

    /// Replaces the global term list for this site
    #[serde(rename = "search-terms")]
    pub search_terms: Option<Vec<String>>,
}

/// A fully resolved site, immutable for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Case-folded site identity
    pub name: String,

    /// Front page URL, also used for the same-site link check
    pub url: String,

    /// Lower-cased search terms, in configured order
    pub search_terms: Vec<String>,

    /// Anchor attribute read for article titles
    pub title_attribute: String,
}

impl Site {
    pub fn describe(&self) -> String {
        format!("{} | {}", self.name, self.url)
    }
}
