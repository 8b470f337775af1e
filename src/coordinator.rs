//! Run orchestration across a fixed pool of workers.
//!
//! A run has exactly two synchronization points:
//!
//! 1. **Broadcast**: the coordinator sends the [`RunParams`] once over a
//!    broadcast channel that every worker subscribed to before the send.
//! 2. **Gather**: the coordinator awaits every worker's [`HarvestResult`]
//!    before aggregation starts. Results are collected in worker id order.
//!
//! Between the two, each worker runs partition → harvest → download on its
//! own [`HttpClient`] without sharing mutable state with other workers.
//! Failures inside a worker's loop never abort the run; only a broken
//! broadcast, a worker that cannot start, or a panicked worker is fatal.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::aggregate::{Aggregate, aggregate};
use crate::download::{
    ArtifactDownloader, CollisionPolicy, DEFAULT_FALLBACK_THRESHOLD, DownloadOutcome, FallbackPlan,
};
use crate::harvest::{HarvestEntry, HarvestResult, Harvester, RetryPolicy};
use crate::metadata::{self, METADATA_FILENAME, PersistError};
use crate::partition::{PartitionError, WorkerContext};
use crate::record::{ArticleRecord, RunParams};
use crate::search::{ResultPageParser, SearchEndpoint};
use crate::transport::{FetchError, HttpClient, TransportSettings};

/// Default number of workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Run parameters were rejected before the broadcast.
    #[error("invalid run parameters: {0}")]
    InvalidParams(String),

    /// The worker pool could not be formed.
    #[error("invalid worker pool: {0}")]
    Pool(#[from] PartitionError),

    /// The run parameters could not be delivered to every worker.
    #[error("failed to broadcast run parameters: {0}")]
    Broadcast(String),

    /// A worker could not build its transport session.
    #[error("worker {worker} could not start: {source}")]
    WorkerStart {
        /// Failing worker.
        worker: usize,
        /// Underlying transport error.
        #[source]
        source: FetchError,
    },

    /// A worker task panicked or was cancelled before reporting.
    #[error("worker {worker} did not report a result: {message}")]
    WorkerLost {
        /// Failing worker.
        worker: usize,
        /// Join error description.
        message: String,
    },

    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// Directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The metadata document could not be written.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The fallback transport could not be built.
    #[error("fallback transport unavailable: {0}")]
    Fallback(#[source] FetchError),
}

/// Settings shared by every worker of a run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Directory receiving artifacts and the metadata document.
    pub output_dir: PathBuf,
    /// Size of the worker pool.
    pub workers: usize,
    /// Search endpoint.
    pub endpoint: SearchEndpoint,
    /// Result page parser.
    pub parser: ResultPageParser,
    /// Per-worker HTTP client settings.
    pub transport: TransportSettings,
    /// Page fetch retry policy.
    pub retry_policy: RetryPolicy,
    /// Filename collision handling.
    pub collision: CollisionPolicy,
    /// Unresolved fraction at which an HTML run offers the PDF fallback.
    pub fallback_threshold: f64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            workers: DEFAULT_WORKERS,
            endpoint: SearchEndpoint::default(),
            parser: ResultPageParser::default(),
            transport: TransportSettings::default(),
            retry_policy: RetryPolicy::default(),
            collision: CollisionPolicy::default(),
            fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Final records and their download outcomes.
    pub aggregate: Aggregate,
    /// Where the metadata document was written.
    pub metadata_path: PathBuf,
    /// PDF fallback offer, for HTML runs with enough unresolved records.
    pub fallback: Option<FallbackPlan>,
}

impl RunReport {
    /// True when the topic produced no results at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aggregate.is_empty()
    }
}

/// Drives one harvest run from broadcast to persisted metadata.
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: Arc<HarvestConfig>,
}

impl Coordinator {
    /// Creates a coordinator for `config`.
    #[must_use]
    pub fn new(config: HarvestConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Path of the metadata document for this configuration.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.config.output_dir.join(METADATA_FILENAME)
    }

    /// Executes a full run.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError`] only for failures of the run as a whole:
    /// invalid parameters, an unusable output directory, a broken broadcast or
    /// gather, or an unwritable metadata document. Page and artifact failures
    /// are absorbed into the report.
    #[instrument(skip_all, fields(topic = %params.topic, amount = params.amount, format = %params.format))]
    pub async fn run(&self, params: RunParams) -> Result<RunReport, CoordinatorError> {
        validate(&params)?;
        let pool = WorkerContext::pool(self.config.workers)?;

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|source| CoordinatorError::OutputDir {
                path: self.config.output_dir.clone(),
                source,
            })?;

        let (params_tx, _) = broadcast::channel::<Arc<RunParams>>(1);
        let handles: Vec<_> = pool
            .into_iter()
            .map(|worker| {
                let params_rx = params_tx.subscribe();
                let config = Arc::clone(&self.config);
                tokio::spawn(run_worker(worker, params_rx, config))
            })
            .collect();

        let format = params.format;
        let amount = params.amount;
        params_tx
            .send(Arc::new(params))
            .map_err(|_| CoordinatorError::Broadcast("no worker is listening".to_string()))?;
        info!(workers = handles.len(), "run parameters broadcast");

        let mut results = Vec::with_capacity(handles.len());
        for (id, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(Ok(result)) => results.push(result),
                Ok(Err(error)) => return Err(error),
                Err(join_error) => {
                    return Err(CoordinatorError::WorkerLost {
                        worker: id,
                        message: join_error.to_string(),
                    });
                }
            }
        }
        info!(workers = results.len(), "all workers reported");

        let aggregate = aggregate(results, amount);
        if aggregate.is_empty() {
            warn!("the search returned no results for this topic");
        }

        let metadata_path = self.metadata_path();
        metadata::persist(&metadata_path, aggregate.records()).await?;

        let fallback =
            FallbackPlan::for_entries(&aggregate.entries, format, self.config.fallback_threshold);
        if let Some(plan) = &fallback {
            info!(
                records = plan.len(),
                fraction = plan.fraction(),
                "PDF fallback available"
            );
        }

        Ok(RunReport {
            aggregate,
            metadata_path,
            fallback,
        })
    }

    /// Retries every record of `plan` as PDF with a fresh client.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Fallback`] when the client cannot be built.
    /// Individual download failures are reported in the returned outcomes.
    pub async fn run_fallback(
        &self,
        plan: &FallbackPlan,
    ) -> Result<Vec<DownloadOutcome>, CoordinatorError> {
        let transport =
            HttpClient::new(&self.config.transport).map_err(CoordinatorError::Fallback)?;
        let downloader = ArtifactDownloader::new(&self.config.output_dir, self.config.collision);
        Ok(plan.execute(&downloader, &transport).await)
    }
}

fn validate(params: &RunParams) -> Result<(), CoordinatorError> {
    if params.topic.trim().is_empty() {
        return Err(CoordinatorError::InvalidParams(
            "topic must not be empty".to_string(),
        ));
    }
    if params.amount == 0 {
        return Err(CoordinatorError::InvalidParams(
            "amount must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

#[instrument(skip_all, fields(worker = worker.id()))]
async fn run_worker(
    worker: WorkerContext,
    mut params_rx: broadcast::Receiver<Arc<RunParams>>,
    config: Arc<HarvestConfig>,
) -> Result<HarvestResult, CoordinatorError> {
    let params = params_rx
        .recv()
        .await
        .map_err(|error| {
            CoordinatorError::Broadcast(format!("worker {} did not receive: {error}", worker.id()))
        })?;
    debug!("received run parameters");

    let transport = HttpClient::new(&config.transport).map_err(|source| {
        CoordinatorError::WorkerStart {
            worker: worker.id(),
            source,
        }
    })?;

    let harvest = Harvester::new(worker, config.endpoint.clone(), config.parser.clone())
        .with_retry_policy(config.retry_policy.clone())
        .harvest(&transport, &params.topic, params.amount)
        .await;

    let downloader = ArtifactDownloader::new(&config.output_dir, config.collision);
    let entries = download_all(worker, &downloader, &transport, harvest.records, &params).await;

    let result = HarvestResult {
        worker,
        entries,
        pages_fetched: harvest.pages_fetched,
        failed_pages: harvest.failed_pages,
        exhausted: harvest.exhausted,
    };
    info!(
        worker = worker.id(),
        records = result.entries.len(),
        download_failures = result.download_failures(),
        "worker finished"
    );
    Ok(result)
}

async fn download_all(
    worker: WorkerContext,
    downloader: &ArtifactDownloader,
    transport: &HttpClient,
    records: Vec<ArticleRecord>,
    params: &RunParams,
) -> Vec<HarvestEntry> {
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let outcome = downloader.download(transport, &record, params.format).await;
        match &outcome {
            DownloadOutcome::Failed(error) => warn!(
                worker = worker.id(),
                title = %record.title,
                error = %error,
                "artifact download failed"
            ),
            DownloadOutcome::SkippedNoSource => debug!(
                worker = worker.id(),
                title = %record.title,
                format = %params.format,
                "no source for requested format"
            ),
            DownloadOutcome::Success(_) => {}
        }
        entries.push(HarvestEntry { record, outcome });
    }
    entries
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::ArtifactFormat;

    fn params(topic: &str, amount: usize) -> RunParams {
        RunParams {
            topic: topic.to_string(),
            amount,
            format: ArtifactFormat::Pdf,
        }
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected_before_broadcast() {
        let dir = tempfile::TempDir::new().unwrap();
        let coordinator = Coordinator::new(HarvestConfig {
            output_dir: dir.path().join("out"),
            ..HarvestConfig::default()
        });
        let error = coordinator.run(params("quantum", 0)).await.unwrap_err();
        assert!(matches!(error, CoordinatorError::InvalidParams(_)));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_blank_topic_is_rejected() {
        let coordinator = Coordinator::new(HarvestConfig::default());
        let error = coordinator.run(params("   ", 5)).await.unwrap_err();
        assert!(matches!(error, CoordinatorError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_empty_pool_is_rejected() {
        let coordinator = Coordinator::new(HarvestConfig {
            workers: 0,
            ..HarvestConfig::default()
        });
        let error = coordinator.run(params("quantum", 5)).await.unwrap_err();
        assert!(matches!(error, CoordinatorError::Pool(PartitionError::EmptyPool)));
    }
}
