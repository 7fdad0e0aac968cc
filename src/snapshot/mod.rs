//! Snapshot records produced by a crawl pass
//!
//! These types define the JSON shape shared by the backup files and the
//! stored payloads: camelCase field names, with the site record keyed by
//! `_id`.

use crate::crawler::WordDictionary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An article link discovered on a front page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLink {
    pub url: String,
    pub title: String,
}

/// Counts for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub total_words: WordDictionary,

    /// Number of article blocks, set only for the front page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_articles: Option<usize>,
}

/// Counts for one followed article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResult {
    pub total_words: WordDictionary,
    pub article_name: String,
    pub article_link: String,
}

/// Aggregate over all followed articles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesSnapshot {
    /// Elementwise sum of every article's counts
    pub total_words: WordDictionary,

    pub total_articles: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articles: Option<Vec<ArticleResult>>,
}

/// One timestamped pass over one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSnapshot {
    pub created_at: DateTime<Utc>,
    pub main_page: PageSnapshot,
    pub main_page_articles: ArticlesSnapshot,
}

/// The full history of one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    #[serde(rename = "_id")]
    pub name: String,

    pub url: String,

    /// When the site was first stored
    pub created_at: DateTime<Utc>,

    /// When the latest snapshot was committed
    pub updated_at: DateTime<Utc>,

    /// Snapshots in chronological order
    #[serde(default)]
    pub data: Vec<CrawlSnapshot>,
}

impl SiteRecord {
    pub fn new(name: impl Into<String>, url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            created_at: now,
            updated_at: now,
            data: Vec::new(),
        }
    }

    /// Appends a snapshot committed at `at`
    ///
    /// `updated_at` never moves backwards.
    pub fn append(&mut self, snapshot: CrawlSnapshot, at: DateTime<Utc>) {
        self.data.push(snapshot);
        if at > self.updated_at {
            self.updated_at = at;
        }
    }

    pub fn latest(&self) -> Option<&CrawlSnapshot> {
        self.data.last()
    }
}

/// Assembles a [`CrawlSnapshot`] as a pass progresses
pub struct SnapshotBuilder {
    created_at: DateTime<Utc>,
    terms: Vec<String>,
    include_articles: bool,
    main_page: Option<PageSnapshot>,
    articles: Vec<ArticleResult>,
}

impl SnapshotBuilder {
    /// Starts a snapshot for a pass that began at `created_at`
    pub fn new(created_at: DateTime<Utc>, terms: &[String], include_articles: bool) -> Self {
        Self {
            created_at,
            terms: terms.to_vec(),
            include_articles,
            main_page: None,
            articles: Vec::new(),
        }
    }

    pub fn main_page(mut self, total_words: WordDictionary, total_articles: usize) -> Self {
        self.main_page = Some(PageSnapshot {
            total_words,
            total_articles: Some(total_articles),
        });
        self
    }

    pub fn push_article(&mut self, article: ArticleResult) {
        self.articles.push(article);
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    pub fn build(self) -> CrawlSnapshot {
        let mut total_words = WordDictionary::zeroed(&self.terms);
        for article in &self.articles {
            total_words += &article.total_words;
        }

        let main_page = self.main_page.unwrap_or_else(|| PageSnapshot {
            total_words: WordDictionary::zeroed(&self.terms),
            total_articles: Some(0),
        });

        CrawlSnapshot {
            created_at: self.created_at,
            main_page,
            main_page_articles: ArticlesSnapshot {
                total_words,
                total_articles: self.articles.len(),
                articles: self.include_articles.then_some(self.articles),
            },
        }
    }
}
