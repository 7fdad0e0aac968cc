//! Two-level crawl of a single site
//!
//! The front page is fetched and its `<article>` blocks counted; each block
//! that links to an article of the same site contributes one more fetch.
//! Nothing found on an article page is followed, so the depth is bounded by
//! construction.

use crate::config::{CrawlerConfig, Site};
use crate::crawler::counter::count_words;
use crate::crawler::fetcher::{Document, Fetcher, RetryPolicy, Transport};
use crate::crawler::parser::{article_page_text, summarize_front_page};
use crate::crawler::scheduler::PolitenessThrottle;
use crate::snapshot::{ArticleLink, ArticleResult, CrawlSnapshot, SnapshotBuilder};
use crate::state::{CrawlPass, CrawlState};
use crate::{Result, WordwatchError};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

/// Tunables for one site pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Upper bound on article fetches in flight
    pub max_concurrent_articles: usize,

    /// Whether the snapshot lists every article
    pub include_articles: bool,
}

impl CrawlOptions {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_concurrent_articles: config.max_concurrent_articles.max(1) as usize,
            include_articles: config.include_articles,
        }
    }
}

/// Crawls one site: front page, then its linked articles
pub struct SiteCrawler<T> {
    fetcher: Fetcher<T>,
    throttle: PolitenessThrottle,
    options: CrawlOptions,
}

impl<T: Transport> SiteCrawler<T> {
    pub fn new(fetcher: Fetcher<T>, throttle: PolitenessThrottle, options: CrawlOptions) -> Self {
        Self {
            fetcher,
            throttle,
            options,
        }
    }

    pub fn from_config(transport: T, config: &CrawlerConfig) -> Self {
        Self::new(
            Fetcher::new(transport, RetryPolicy::from_config(config)),
            PolitenessThrottle::from_config(config),
            CrawlOptions::from_config(config),
        )
    }

    /// Runs the pass for `site`
    ///
    /// `pass` must be in `Guarded`; on success it is left in `SnapshotReady`.
    /// A front page without any `<article>` block fails the pass with
    /// [`WordwatchError::StructureMismatch`]. Individual article failures only
    /// omit that article.
    pub async fn crawl(
        &self,
        site: &Site,
        created_at: DateTime<Utc>,
        pass: &mut CrawlPass,
    ) -> Result<CrawlSnapshot> {
        let document = self.fetch(&site.url).await?;
        let front_page = summarize_front_page(&document.body, &site.url, &site.title_attribute);

        if front_page.blocks.is_empty() {
            return Err(WordwatchError::StructureMismatch {
                url: site.url.clone(),
            });
        }

        let total_blocks = front_page.blocks.len();
        let mut builder = SnapshotBuilder::new(
            created_at,
            &site.search_terms,
            self.options.include_articles,
        )
        .main_page(
            count_words(&front_page.text, &site.search_terms),
            total_blocks,
        );
        pass.advance(CrawlState::MainPageFetched)?;
        tracing::info!("{}: {} article blocks on front page", site.name, total_blocks);

        let work: Vec<(String, Option<ArticleLink>)> = front_page
            .blocks
            .into_iter()
            .map(|block| {
                let link = block.link.map(|url| ArticleLink {
                    url,
                    title: block.title.clone(),
                });
                (block.title, link)
            })
            .collect();
        pass.advance(CrawlState::ArticlesEnumerated)?;

        // Unlinked blocks resolve at once, so progress follows block order
        let mut results = stream::iter(work)
            .map(|(title, link)| async move {
                match link {
                    Some(link) => {
                        let result = self.crawl_article(site, &link).await;
                        (title, Some((link, result)))
                    }
                    None => (title, None),
                }
            })
            .buffered(self.options.max_concurrent_articles);

        let mut processed = 0;
        while let Some((title, fetched)) = results.next().await {
            processed += 1;
            match fetched {
                Some((_, Ok(article))) => builder.push_article(article),
                Some((link, Err(e))) => tracing::warn!(
                    "{}: omitting article \"{}\" ({}): {}",
                    site.name,
                    link.title,
                    link.url,
                    e
                ),
                None => tracing::warn!(
                    "{}: could not find an article link for \"{}\"",
                    site.name,
                    title
                ),
            }
            tracing::info!("{}: [{}/{}]", site.name, processed, total_blocks);
        }
        pass.advance(CrawlState::ArticlesAggregated)?;

        tracing::info!(
            "{}: {} of {} articles counted",
            site.name,
            builder.article_count(),
            total_blocks
        );

        let snapshot = builder.build();
        pass.advance(CrawlState::SnapshotReady)?;
        Ok(snapshot)
    }

    async fn crawl_article(&self, site: &Site, link: &ArticleLink) -> Result<ArticleResult> {
        let document = self.fetch(&link.url).await?;
        let text = article_page_text(&document.body).ok_or_else(|| {
            WordwatchError::StructureMismatch {
                url: link.url.clone(),
            }
        })?;

        Ok(ArticleResult {
            total_words: count_words(&text, &site.search_terms),
            article_name: link.title.clone(),
            article_link: link.url.clone(),
        })
    }

    async fn fetch(&self, url: &str) -> Result<Document> {
        self.throttle.wait_turn(url).await;
        Ok(self.fetcher.fetch(url).await?)
    }
}
