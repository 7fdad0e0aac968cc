//! HTML parser for article blocks
//!
//! This module handles parsing HTML content to extract:
//! - The `<article>` blocks of a page
//! - The visible text of each block
//! - A display title and the first qualifying article link of each block
//!
//! `scraper::Html` is not `Send`, so callers summarize a page into owned
//! [`BlockSummary`] values before crossing an await point.

use crate::url::qualify_article_href;
use scraper::{ElementRef, Html, Selector};

/// Title recorded for a block that has no titled anchor
pub const NO_TITLE: &str = "no title";

/// A parsed HTML document
pub struct ParsedDocument {
    html: Html,
}

impl ParsedDocument {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// Returns every `<article>` element in document order
    ///
    /// Nested articles are returned as well, so their text is seen twice.
    pub fn find_article_blocks(&self) -> Vec<ArticleBlock<'_>> {
        let mut blocks = Vec::new();
        if let Ok(selector) = Selector::parse("article") {
            for element in self.html.select(&selector) {
                blocks.push(ArticleBlock { element });
            }
        }
        blocks
    }

    /// Concatenated text of all article blocks, space-separated
    pub fn article_text(&self) -> String {
        self.find_article_blocks()
            .iter()
            .map(ArticleBlock::extract_text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One `<article>` element
pub struct ArticleBlock<'a> {
    element: ElementRef<'a>,
}

impl<'a> ArticleBlock<'a> {
    /// All descendant text nodes, concatenated
    pub fn extract_text(&self) -> String {
        self.element.text().collect()
    }

    /// Value of `attribute` on the first anchor carrying it, or "no title"
    pub fn extract_title(&self, attribute: &str) -> String {
        self.anchors()
            .into_iter()
            .find_map(|anchor| anchor.value().attr(attribute))
            .map(str::to_string)
            .unwrap_or_else(|| NO_TITLE.to_string())
    }

    /// First anchor href that qualifies as an article of `base_url`
    pub fn extract_link(&self, base_url: &str) -> Option<String> {
        self.anchors()
            .into_iter()
            .filter_map(|anchor| anchor.value().attr("href"))
            .find_map(|href| qualify_article_href(href, base_url))
    }

    pub fn summarize(&self, base_url: &str, title_attribute: &str) -> BlockSummary {
        BlockSummary {
            text: self.extract_text(),
            title: self.extract_title(title_attribute),
            link: self.extract_link(base_url),
        }
    }

    fn anchors(&self) -> Vec<ElementRef<'a>> {
        match Selector::parse("a") {
            Ok(selector) => self.element.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Owned extract of one article block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    pub text: String,
    pub title: String,
    pub link: Option<String>,
}

/// Owned extract of a front page
#[derive(Debug, Clone, Default)]
pub struct FrontPage {
    /// Block texts joined with a single space
    pub text: String,

    pub blocks: Vec<BlockSummary>,
}

/// Parses a front page into its block summaries
pub fn summarize_front_page(body: &str, base_url: &str, title_attribute: &str) -> FrontPage {
    let document = ParsedDocument::parse(body);
    let blocks: Vec<BlockSummary> = document
        .find_article_blocks()
        .iter()
        .map(|block| block.summarize(base_url, title_attribute))
        .collect();

    let text = blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    FrontPage { text, blocks }
}

/// Article text of an article page, or None when it has no `<article>` blocks
pub fn article_page_text(body: &str) -> Option<String> {
    let document = ParsedDocument::parse(body);
    if document.find_article_blocks().is_empty() {
        None
    } else {
        Some(document.article_text())
    }
}
