//! Search URL construction.

use url::Url;

/// Number of results requested per search page.
pub const PAGE_SIZE: usize = 50;

/// Default search endpoint.
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://arxiv.org/search/";

/// Default site root used to resolve abstract and full-text links.
pub const DEFAULT_SITE_BASE_URL: &str = "https://arxiv.org/";

/// A paginated search endpoint.
///
/// Building a page URL is a pure, infallible operation; the base URL is
/// validated once when the endpoint is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEndpoint {
    base: Url,
}

impl Default for SearchEndpoint {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_SEARCH_BASE_URL).expect("default search URL is valid"),
        }
    }
}

impl SearchEndpoint {
    /// Creates an endpoint rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when `base` is not an absolute URL.
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?,
        })
    }

    /// Builds the URL of result page `page_index` for `topic`.
    ///
    /// Results are ordered most-recent-first, [`PAGE_SIZE`] per page, with a
    /// start offset of `page_index * PAGE_SIZE`.
    #[must_use]
    pub fn page_url(&self, topic: &str, page_index: usize) -> String {
        let mut base = self.base.clone();
        base.set_query(None);
        base.set_fragment(None);
        format!(
            "{base}?query={}&searchtype=all&abstracts=show&order=-announced_date_first&size={PAGE_SIZE}&start={}",
            urlencoding::encode(topic.trim()),
            page_index.saturating_mul(PAGE_SIZE)
        )
    }
}
