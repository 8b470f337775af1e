//! Artifact download for harvested records.
//!
//! This module persists the PDF or HTML rendition of an
//! [`ArticleRecord`](crate::record::ArticleRecord) into the shared output
//! directory.
//!
//! # Features
//!
//! - Filesystem-safe filenames derived from the record title (max 100 chars)
//! - Every failure reported as a [`DownloadOutcome`] value, never raised
//! - Records without a source for the requested format are skipped, not failed
//! - Configurable filename collision handling ([`CollisionPolicy`])
//! - Opt-in PDF fallback for HTML runs ([`FallbackPlan`])
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::download::{ArtifactDownloader, CollisionPolicy};
//! use harvester_core::record::{ArticleRecord, ArtifactFormat};
//! use harvester_core::transport::{HttpClient, TransportSettings};
//!
//! # async fn example(record: ArticleRecord) -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&TransportSettings::default())?;
//! let downloader = ArtifactDownloader::new("./output", CollisionPolicy::Overwrite);
//! let outcome = downloader.download(&client, &record, ArtifactFormat::Pdf).await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod artifact;
mod error;
mod fallback;
mod filename;

pub use artifact::{ArtifactDownloader, CollisionPolicy, DownloadOutcome};
pub use error::DownloadError;
pub use fallback::{DEFAULT_FALLBACK_THRESHOLD, FallbackPlan};
pub use filename::{MAX_FILENAME_BYTES, MAX_FILENAME_STEM_CHARS, artifact_filename};
