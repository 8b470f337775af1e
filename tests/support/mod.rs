//! Shared fixtures for integration tests: search result markup and a
//! harvest configuration pointed at a wiremock server.

#![allow(dead_code)]

use std::path::Path;

use harvester_core::{
    ArticleRecord, HarvestConfig, METADATA_FILENAME, ResultPageParser, SearchEndpoint,
};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One `li.arxiv-result` block.
#[derive(Debug, Clone)]
pub struct ResultBlock {
    pub id: String,
    pub title: String,
    /// Emit the `[pdf]` link.
    pub pdf: bool,
    /// Emit the `/abs/` link the HTML rendition is derived from.
    pub abs: bool,
}

impl ResultBlock {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            pdf: true,
            abs: true,
        }
    }

    pub fn without_abs(mut self) -> Self {
        self.abs = false;
        self
    }

    pub fn without_pdf(mut self) -> Self {
        self.pdf = false;
        self
    }

    /// Markup for this block with links rooted at `base`.
    pub fn render(&self, base: &str) -> String {
        let abs = if self.abs {
            format!(r#"<a href="{base}/abs/{id}">arXiv:{id}</a>"#, id = self.id)
        } else {
            format!("<span>arXiv:{}</span>", self.id)
        };
        let pdf = if self.pdf {
            format!(r#"<span>[<a href="{base}/pdf/{id}">pdf</a>]</span>"#, id = self.id)
        } else {
            String::new()
        };
        format!(
            r#"
<li class="arxiv-result">
  <div class="is-marginless">
    <p class="list-title is-inline-block">{abs} {pdf}</p>
  </div>
  <p class="title is-5 mathjax">
    {title}
  </p>
  <p class="authors">
    <span class="search-hit">Authors:</span>
    <a href="{base}/search/?searchtype=author&amp;query=Ada">Ada Lovelace</a>,
    <a href="{base}/search/?searchtype=author&amp;query=Alan">Alan Turing</a>
  </p>
  <p class="abstract mathjax">
    <span class="abstract-full has-text-grey-dark mathjax">
      Abstract of {title}.
      <a class="is-size-7">&#9651; Less</a>
    </span>
  </p>
</li>"#,
            title = self.title
        )
    }
}

/// `count` well-formed blocks titled `"{prefix} {n}"` for `n` in `first..first+count`.
pub fn numbered(prefix: &str, first: usize, count: usize) -> Vec<ResultBlock> {
    (first..first + count)
        .map(|n| ResultBlock::new(format!("2401.{n:05}"), format!("{prefix} {n}")))
        .collect()
}

/// A full search result page.
pub fn result_page(base: &str, blocks: &[ResultBlock]) -> String {
    let items: String = blocks.iter().map(|block| block.render(base)).collect();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Search | arXiv e-print repository</title></head>
<body>
<main>
  <ol class="breathe-horizontal" start="1">{items}
  </ol>
</main>
</body>
</html>"#
    )
}

/// Serves `blocks` as the result page with start offset `start`.
pub async fn mount_page(server: &MockServer, start: usize, blocks: &[ResultBlock]) {
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("start", start.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(result_page(&server.uri(), blocks)))
        .expect(1)
        .mount(server)
        .await;
}

/// Serves every `/pdf/...` and `/html/...` path with a small body.
pub async fn mount_artifacts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/pdf/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 fixture".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>fixture</html>"))
        .mount(server)
        .await;
}

/// Harvest configuration targeting `server`.
pub fn harvest_config(server: &MockServer, output_dir: &Path, workers: usize) -> HarvestConfig {
    let base = server.uri();
    HarvestConfig {
        output_dir: output_dir.to_path_buf(),
        workers,
        endpoint: SearchEndpoint::new(&format!("{base}/search/")).expect("valid search URL"),
        parser: ResultPageParser::new(&format!("{base}/")).expect("valid site URL"),
        ..HarvestConfig::default()
    }
}

/// Reads back the metadata document written into `output_dir`.
pub fn read_metadata(output_dir: &Path) -> Vec<ArticleRecord> {
    let raw = std::fs::read_to_string(output_dir.join(METADATA_FILENAME))
        .expect("metadata document should exist");
    serde_json::from_str(&raw).expect("metadata should be a JSON array of records")
}

/// Titles in order.
pub fn titles(records: &[ArticleRecord]) -> Vec<String> {
    records.iter().map(|record| record.title.clone()).collect()
}

/// Sorted names of the files in `dir`, excluding the metadata document.
pub fn artifact_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("output dir should exist")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .filter(|name| name != METADATA_FILENAME)
        .collect();
    names.sort();
    names
}
