//! Search index access: query URL construction and result page parsing.
//!
//! - [`SearchEndpoint`] maps a topic and zero-based page index to a
//!   deterministic, most-recent-first search URL.
//! - [`ResultPageParser`] turns one fetched result page into
//!   [`ArticleRecord`](crate::record::ArticleRecord)s in document order.

mod parser;
mod query;

pub use parser::{ABSTRACT_BOILERPLATE_SUFFIX, ParsedPage, ResultPageParser, abstract_identifier};
pub use query::{DEFAULT_SEARCH_BASE_URL, DEFAULT_SITE_BASE_URL, PAGE_SIZE, SearchEndpoint};
