//! URL handling module for Wordwatch
//!
//! This module provides domain extraction, site-name derivation, and the
//! heuristics deciding whether an anchor on a front page points at an
//! article of the same site.

mod domain;
mod links;

// Re-export main functions
pub use domain::{extract_domain, site_name_from_url};
pub use links::{has_page_extension, is_same_site, qualify_article_href, resolve_href};
