//! Configuration module for Wordwatch
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and resolving `[[site]]` entries into crawlable [`Site`] values.
//!
//! # Example
//!
//! ```no_run
//! use wordwatch::config::{load_config, resolve_sites};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("wordwatch.toml")).unwrap();
//! for site in resolve_sites(&config).into_iter().flatten() {
//!     println!("{}", site.describe());
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, Site, SiteEntry, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{resolve_sites, DEFAULT_TITLE_ATTRIBUTE};
