//! Result page parsing.
//!
//! A search result page is a list of `li.arxiv-result` blocks. Each block is
//! parsed independently: a block without a title is skipped with a warning
//! and the remaining blocks on the page are still returned.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::query::DEFAULT_SITE_BASE_URL;
use crate::record::ArticleRecord;

/// Trailing toggle text appended to every expanded abstract.
pub const ABSTRACT_BOILERPLATE_SUFFIX: &str = "△ Less";

#[allow(clippy::expect_used)]
static RESULT_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.arxiv-result").expect("result selector is valid"));

#[allow(clippy::expect_used)]
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.title").expect("title selector is valid"));

#[allow(clippy::expect_used)]
static AUTHOR_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.authors a").expect("authors selector is valid"));

#[allow(clippy::expect_used)]
static ABSTRACT_FULL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.abstract-full").expect("abstract selector is valid"));

#[allow(clippy::expect_used)]
static LIST_TITLE_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.list-title a[href]").expect("link selector is valid"));

#[allow(clippy::expect_used)]
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Matches the identifier part of an abstract page link: `/abs/<id>[vN]`.
#[allow(clippy::expect_used)]
static ABSTRACT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/abs/([^?#\s]+?)/?(?:[?#]|$)").expect("abstract id regex is valid")
});

/// Outcome of parsing one result page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Successfully parsed records in document order.
    pub records: Vec<ArticleRecord>,
    /// Result blocks that were present but could not be parsed.
    pub skipped_blocks: usize,
}

impl ParsedPage {
    /// True when the page contained no result blocks at all.
    ///
    /// This is the end-of-results signal. A page whose blocks were all
    /// malformed is not exhausted.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.records.is_empty() && self.skipped_blocks == 0
    }
}

/// Converts result page markup into [`ArticleRecord`]s.
#[derive(Debug, Clone)]
pub struct ResultPageParser {
    site_base: Url,
}

impl Default for ResultPageParser {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            site_base: Url::parse(DEFAULT_SITE_BASE_URL).expect("default site URL is valid"),
        }
    }
}

impl ResultPageParser {
    /// Creates a parser that resolves links against `site_base`.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when `site_base` is not an absolute URL.
    pub fn new(site_base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            site_base: Url::parse(site_base)?,
        })
    }

    /// Parses one page of markup.
    #[must_use]
    pub fn parse(&self, markup: &str) -> ParsedPage {
        let document = Html::parse_document(markup);
        let mut page = ParsedPage::default();

        for (index, block) in document.select(&RESULT_BLOCK).enumerate() {
            match self.parse_block(block) {
                Some(record) => page.records.push(record),
                None => {
                    warn!(block = index, "skipping result block without a title");
                    page.skipped_blocks += 1;
                }
            }
        }

        debug!(
            records = page.records.len(),
            skipped = page.skipped_blocks,
            "parsed result page"
        );
        page
    }

    fn parse_block(&self, block: ElementRef<'_>) -> Option<ArticleRecord> {
        let title = block
            .select(&TITLE)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|title| !title.is_empty())?;

        let authors = block
            .select(&AUTHOR_LINKS)
            .map(|a| collapse_whitespace(&a.text().collect::<String>()))
            .filter(|name| !name.is_empty())
            .collect();

        let abstract_text = block
            .select(&ABSTRACT_FULL)
            .next()
            .map(|el| clean_abstract(&el.text().collect::<String>()))
            .unwrap_or_default();

        let links: Vec<ElementRef<'_>> = block.select(&LIST_TITLE_LINKS).collect();

        let pdf_source = links
            .iter()
            .find(|a| a.text().collect::<String>().trim().eq_ignore_ascii_case("pdf"))
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| self.resolve(href));

        let html_source = links
            .iter()
            .filter_map(|a| a.value().attr("href"))
            .find_map(abstract_identifier)
            .and_then(|id| self.site_base.join(&format!("html/{id}")).ok())
            .map(String::from);

        Some(ArticleRecord {
            title,
            authors,
            abstract_text,
            pdf_source,
            html_source,
        })
    }

    fn resolve(&self, href: &str) -> Option<String> {
        self.site_base.join(href.trim()).ok().map(String::from)
    }
}

/// Extracts the canonical item identifier from an abstract page link.
///
/// Accepts absolute and relative links (`https://arxiv.org/abs/2401.01234v2`,
/// `/abs/hep-th/9901001`).
#[must_use]
pub fn abstract_identifier(href: &str) -> Option<String> {
    ABSTRACT_ID
        .captures(href.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| !id.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

fn clean_abstract(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    collapsed
        .strip_suffix(ABSTRACT_BOILERPLATE_SUFFIX)
        .unwrap_or(&collapsed)
        .trim_end()
        .to_string()
}
