//! Core data types shared by every stage of the harvesting pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One harvested bibliographic entry.
///
/// Records are produced by the result page parser and never mutated
/// afterwards. Download results are tracked alongside them, not inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Non-empty article title.
    pub title: String,
    /// Author display names in page order.
    pub authors: Vec<String>,
    /// Abstract text with boilerplate removed.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Direct PDF link, when the result listed one.
    #[serde(rename = "pdf_url")]
    pub pdf_source: Option<String>,
    /// Full-text HTML rendition derived from the item identifier.
    #[serde(rename = "html_url")]
    pub html_source: Option<String>,
}

impl ArticleRecord {
    /// Returns the source URL for the requested artifact format, if any.
    #[must_use]
    pub fn source_for(&self, format: ArtifactFormat) -> Option<&str> {
        match format {
            ArtifactFormat::Pdf => self.pdf_source.as_deref(),
            ArtifactFormat::Html => self.html_source.as_deref(),
        }
    }
}

/// Artifact formats that can be downloaded for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// PDF rendition.
    Pdf,
    /// Full-text HTML rendition.
    Html,
}

impl ArtifactFormat {
    /// File extension used for persisted artifacts, including the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Html => ".html",
        }
    }

    /// Stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown artifact format '{other}' (expected pdf or html)")),
        }
    }
}

/// Parameters broadcast from the coordinator to every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    /// Free-text search topic.
    pub topic: String,
    /// Requested total number of records (positive).
    pub amount: usize,
    /// Requested artifact format.
    pub format: ArtifactFormat,
}
