//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: The stages of one site's crawl pass
//! - `CrawlPass`: Walks one site through those stages, rejecting illegal steps
//! - `HostState`: Tracks per-host request spacing for the politeness delay

mod crawl_state;
mod host_state;

// Re-export main types
pub use crawl_state::{CrawlPass, CrawlState};
pub use host_state::HostState;
