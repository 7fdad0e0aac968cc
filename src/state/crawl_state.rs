//! Crawl state definitions for one pass over one site
//!
//! A pass starts `Idle`, is gated by the freshness guard, and then walks the
//! two crawl levels in order. `Skipped`, `Failed` and `Done` are terminal.

use crate::WordwatchError;
use std::fmt;

/// Represents the current state of a site crawl pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// Nothing has happened yet
    Idle,

    /// The freshness guard is consulted against the stored history
    Guarded,

    /// The front page was fetched and its article blocks counted
    MainPageFetched,

    /// Article links were collected into the work list
    ArticlesEnumerated,

    /// Every listed article was fetched (or omitted) and summed
    ArticlesAggregated,

    /// The snapshot is assembled and ready to be handed over
    SnapshotReady,

    // ===== Terminal States =====
    /// The snapshot was handed to the persistence boundary
    Done,

    /// The site was crawled too recently
    Skipped,

    /// The pass was abandoned because of a site-scoped error
    Failed,
}

impl CrawlState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Failed)
    }

    /// Checks whether moving from `self` to `next` is a legal step
    ///
    /// Any active state may fail. Only `Guarded` may lead to `Skipped`.
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Idle, Guarded)
                | (Guarded, Skipped)
                | (Guarded, MainPageFetched)
                | (MainPageFetched, ArticlesEnumerated)
                | (ArticlesEnumerated, ArticlesAggregated)
                | (ArticlesAggregated, SnapshotReady)
                | (SnapshotReady, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Guarded => "guarded",
            Self::MainPageFetched => "main_page_fetched",
            Self::ArticlesEnumerated => "articles_enumerated",
            Self::ArticlesAggregated => "articles_aggregated",
            Self::SnapshotReady => "snapshot_ready",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the state of one site's pass and rejects illegal steps
#[derive(Debug, Clone)]
pub struct CrawlPass {
    site: String,
    state: CrawlState,
}

impl CrawlPass {
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            state: CrawlState::Idle,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Moves the pass to `next`
    pub fn advance(&mut self, next: CrawlState) -> Result<(), WordwatchError> {
        if !self.state.can_transition_to(next) {
            return Err(WordwatchError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("{}: {} -> {}", self.site, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Marks the pass failed unless it already ended
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = CrawlState::Failed;
        }
    }
}
