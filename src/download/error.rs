//! Error types for the download module.

use std::path::PathBuf;

use thiserror::Error;

use crate::transport::FetchError;

/// Why an artifact download failed.
///
/// Carried inside [`DownloadOutcome::Failed`](super::DownloadOutcome::Failed);
/// the downloader never returns it as an `Err`.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The artifact could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The fetched bytes could not be written.
    #[error("IO error writing to {path}: {source}")]
    Write {
        /// Target file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates a write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
