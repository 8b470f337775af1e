//! Downloading and persisting a single record's artifact.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use super::error::DownloadError;
use super::filename::{artifact_filename, suffixed_path};
use crate::record::{ArticleRecord, ArtifactFormat};
use crate::transport::Transport;

/// Highest duplicate counter tried under [`CollisionPolicy::Suffix`].
const MAX_SUFFIX: usize = 1000;

/// Result of downloading one record's artifact.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Bytes were written to the contained path.
    Success(PathBuf),
    /// The record has no source for the requested format. Nothing was written.
    SkippedNoSource,
    /// Fetching or writing failed.
    Failed(DownloadError),
}

impl DownloadOutcome {
    /// True for [`DownloadOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// True for [`DownloadOutcome::SkippedNoSource`].
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedNoSource)
    }

    /// True for [`DownloadOutcome::Failed`].
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Written path, when successful.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Success(path) => Some(path),
            _ => None,
        }
    }
}

/// What to do when the derived filename already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CollisionPolicy {
    /// Replace the existing file.
    #[default]
    Overwrite,
    /// Keep the existing file and write `name_2.ext`, `name_3.ext`, ...
    Suffix,
}

impl CollisionPolicy {
    /// Stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Suffix => "suffix",
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "suffix" => Ok(Self::Suffix),
            other => Err(format!(
                "unknown collision policy '{other}' (expected overwrite or suffix)"
            )),
        }
    }
}

/// Fetches artifacts and writes them into an output directory.
///
/// The output directory is shared by all workers; it must exist before the
/// first download.
#[derive(Debug, Clone)]
pub struct ArtifactDownloader {
    output_dir: PathBuf,
    collision: CollisionPolicy,
}

impl ArtifactDownloader {
    /// Creates a downloader writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, collision: CollisionPolicy) -> Self {
        Self {
            output_dir: output_dir.into(),
            collision,
        }
    }

    /// Downloads the `format` artifact of `record`.
    ///
    /// Never fails: missing sources, transport errors and write errors are
    /// all reported through the returned [`DownloadOutcome`].
    #[instrument(skip_all, fields(title = %record.title, format = %format))]
    pub async fn download<T>(
        &self,
        transport: &T,
        record: &ArticleRecord,
        format: ArtifactFormat,
    ) -> DownloadOutcome
    where
        T: Transport + ?Sized,
    {
        let filename = artifact_filename(&record.title, format);

        let Some(url) = record.source_for(format) else {
            debug!("no source for requested format");
            return DownloadOutcome::SkippedNoSource;
        };

        let bytes = match transport.get(url).await {
            Ok(bytes) => bytes,
            Err(error) => return DownloadOutcome::Failed(DownloadError::from(error)),
        };

        match self.persist(&filename, &bytes).await {
            Ok(path) => {
                info!(path = %path.display(), bytes = bytes.len(), "artifact saved");
                DownloadOutcome::Success(path)
            }
            Err(error) => DownloadOutcome::Failed(error),
        }
    }

    async fn persist(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
        let path = self.output_dir.join(filename);
        match self.collision {
            CollisionPolicy::Overwrite => {
                tokio::fs::write(&path, bytes)
                    .await
                    .map_err(|e| DownloadError::write(path.clone(), e))?;
                Ok(path)
            }
            CollisionPolicy::Suffix => self.persist_new(path, filename, bytes).await,
        }
    }

    /// Writes into the first free candidate path, claimed with `create_new`
    /// so concurrent workers cannot pick the same name.
    async fn persist_new(
        &self,
        first: PathBuf,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, DownloadError> {
        let candidates = std::iter::once(first)
            .chain((2..MAX_SUFFIX).map(|n| suffixed_path(&self.output_dir, filename, n)));

        let mut last_path = self.output_dir.join(filename);
        for path in candidates {
            let open = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match open {
                Ok(mut file) => {
                    file.write_all(bytes)
                        .await
                        .map_err(|e| DownloadError::write(path.clone(), e))?;
                    file.flush()
                        .await
                        .map_err(|e| DownloadError::write(path.clone(), e))?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "name taken, trying next suffix");
                    last_path = path;
                }
                Err(e) => return Err(DownloadError::write(path, e)),
            }
        }

        Err(DownloadError::write(
            last_path,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "no free filename left for duplicate title",
            ),
        ))
    }
}
