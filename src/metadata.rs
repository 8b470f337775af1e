//! Persisting the final record sequence as a JSON document.
//!
//! The document is an array of objects with the fields `title`, `authors`,
//! `abstract`, `pdf_url` and `html_url`, in that order, pretty-printed for
//! human inspection. Non-ASCII text is written as UTF-8, not escaped. Any
//! existing document at the target path is replaced.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument};

use crate::record::ArticleRecord;

/// Default metadata filename inside the output directory.
pub const METADATA_FILENAME: &str = "metadata.json";

/// Errors writing the metadata document.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Serialization failed.
    #[error("failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The document could not be written.
    #[error("IO error writing metadata to {path}: {source}")]
    Io {
        /// Target path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Renders records as the metadata document.
///
/// Output is deterministic: the same records always produce the same bytes.
///
/// # Errors
///
/// Returns [`PersistError::Serialize`] if serialization fails.
pub fn render<'a, I>(records: I) -> Result<String, PersistError>
where
    I: IntoIterator<Item = &'a ArticleRecord>,
{
    let records: Vec<&ArticleRecord> = records.into_iter().collect();
    let mut document = serde_json::to_string_pretty(&records)?;
    document.push('\n');
    Ok(document)
}

/// Writes records to `path`, replacing any previous document.
///
/// # Errors
///
/// Returns [`PersistError`] when serialization or the write fails.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn persist<'a, I>(path: &Path, records: I) -> Result<(), PersistError>
where
    I: IntoIterator<Item = &'a ArticleRecord>,
{
    let document = render(records)?;
    tokio::fs::write(path, document.as_bytes())
        .await
        .map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!(bytes = document.len(), "metadata written");
    Ok(())
}
