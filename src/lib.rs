//! Harvester Core Library
//!
//! This library provides the core functionality for the arxiv-harvester
//! tool, which collects the most recent articles matching a topic from the
//! arXiv search index, saves their PDF or HTML renditions, and writes a
//! metadata document describing them.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`search`] - Query URL construction and result page parsing
//! - [`partition`] - Round-robin assignment of result pages to workers
//! - [`harvest`] - Per-worker page harvesting with local caps
//! - [`download`] - Artifact persistence and the PDF fallback plan
//! - [`aggregate`] - Merging, de-duplicating and truncating worker results
//! - [`metadata`] - The `metadata.json` document
//! - [`coordinator`] - Broadcast, per-worker pipeline and gather
//! - [`transport`] - HTTP fetching behind the [`Transport`] trait

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod coordinator;
pub mod download;
pub mod harvest;
pub mod metadata;
pub mod partition;
pub mod record;
pub mod search;
pub mod transport;
mod user_agent;

// Re-export commonly used types
pub use aggregate::{Aggregate, aggregate};
pub use coordinator::{Coordinator, CoordinatorError, DEFAULT_WORKERS, HarvestConfig, RunReport};
pub use download::{
    ArtifactDownloader, CollisionPolicy, DEFAULT_FALLBACK_THRESHOLD, DownloadError,
    DownloadOutcome, FallbackPlan,
};
pub use harvest::{DEFAULT_PAGE_ATTEMPTS, HarvestEntry, HarvestResult, Harvester, RetryPolicy};
pub use metadata::{METADATA_FILENAME, PersistError};
pub use partition::{PagePartition, PartitionError, WorkerContext};
pub use record::{ArticleRecord, ArtifactFormat, RunParams};
pub use search::{PAGE_SIZE, ResultPageParser, SearchEndpoint};
pub use transport::{FetchError, HttpClient, Transport, TransportSettings};
