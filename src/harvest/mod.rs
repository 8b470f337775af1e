//! Per-worker harvesting of result pages.
//!
//! A [`Harvester`] walks its worker's [`PagePartition`] in ascending order,
//! fetching and parsing one page at a time. It stops early when
//!
//! - the local record count reaches the worker's fair share
//!   (`ceil(amount / worker_count)`), or
//! - a page parses to zero result blocks, which means the global result set
//!   is exhausted.
//!
//! A page that cannot be fetched counts as a page with no records and the
//! worker continues with its next page.

mod retry;

pub use retry::{DEFAULT_PAGE_ATTEMPTS, RetryDecision, RetryPolicy};

use tracing::{debug, info, instrument, warn};

use crate::download::DownloadOutcome;
use crate::partition::{PagePartition, WorkerContext};
use crate::record::ArticleRecord;
use crate::search::{PAGE_SIZE, ParsedPage, ResultPageParser, SearchEndpoint};
use crate::transport::{FetchError, Transport};

/// Records gathered by one worker before any artifact is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHarvest {
    /// Worker that produced the records.
    pub worker: WorkerContext,
    /// Records in discovery order, at most the worker's local cap.
    pub records: Vec<ArticleRecord>,
    /// Pages fetched and parsed successfully.
    pub pages_fetched: usize,
    /// Pages whose fetch failed and were treated as empty.
    pub failed_pages: usize,
    /// Whether the worker stopped on the end-of-results signal.
    pub exhausted: bool,
}

impl PageHarvest {
    fn new(worker: WorkerContext) -> Self {
        Self {
            worker,
            records: Vec::new(),
            pages_fetched: 0,
            failed_pages: 0,
            exhausted: false,
        }
    }
}

/// One harvested record together with the result of downloading its artifact.
#[derive(Debug)]
pub struct HarvestEntry {
    /// The parsed record.
    pub record: ArticleRecord,
    /// Download result for the requested format.
    pub outcome: DownloadOutcome,
}

/// Everything a worker reports back to the coordinator.
#[derive(Debug)]
pub struct HarvestResult {
    /// Reporting worker.
    pub worker: WorkerContext,
    /// Records with their download outcomes, in discovery order.
    pub entries: Vec<HarvestEntry>,
    /// Pages fetched and parsed successfully.
    pub pages_fetched: usize,
    /// Pages whose fetch failed.
    pub failed_pages: usize,
    /// Whether the worker observed the end-of-results signal.
    pub exhausted: bool,
}

impl HarvestResult {
    /// Number of downloads that failed on this worker.
    #[must_use]
    pub fn download_failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.is_failed())
            .count()
    }

    /// Iterates over the records in discovery order.
    pub fn records(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }
}

/// Fetches and parses the pages of one worker's partition.
#[derive(Debug, Clone)]
pub struct Harvester {
    worker: WorkerContext,
    endpoint: SearchEndpoint,
    parser: ResultPageParser,
    retry_policy: RetryPolicy,
}

impl Harvester {
    /// Creates a harvester for `worker`.
    #[must_use]
    pub fn new(worker: WorkerContext, endpoint: SearchEndpoint, parser: ResultPageParser) -> Self {
        Self {
            worker,
            endpoint,
            parser,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replaces the page fetch retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Harvests up to this worker's fair share of `amount` records for `topic`.
    #[instrument(skip(self, transport), fields(worker = self.worker.id()))]
    pub async fn harvest<T>(&self, transport: &T, topic: &str, amount: usize) -> PageHarvest
    where
        T: Transport + ?Sized,
    {
        let partition = PagePartition::for_amount(self.worker, amount, PAGE_SIZE);
        let cap = self.worker.local_cap(amount);
        let mut harvest = PageHarvest::new(self.worker);

        debug!(pages = partition.len(), cap, "starting partition");

        for page in partition.pages() {
            match self.fetch_page(transport, topic, page).await {
                Ok(parsed) if parsed.is_exhausted() => {
                    info!(worker = self.worker.id(), page, "no more results");
                    harvest.pages_fetched += 1;
                    harvest.exhausted = true;
                    break;
                }
                Ok(parsed) => {
                    debug!(page, records = parsed.records.len(), "page harvested");
                    harvest.pages_fetched += 1;
                    harvest.records.extend(parsed.records);
                }
                Err(error) => {
                    warn!(
                        worker = self.worker.id(),
                        page,
                        error = %error,
                        "page fetch failed; treating as empty"
                    );
                    harvest.failed_pages += 1;
                }
            }

            if harvest.records.len() >= cap {
                debug!(page, cap, "local cap reached");
                break;
            }
        }

        harvest.records.truncate(cap);
        info!(
            worker = self.worker.id(),
            records = harvest.records.len(),
            failed_pages = harvest.failed_pages,
            exhausted = harvest.exhausted,
            "harvest finished"
        );
        harvest
    }

    async fn fetch_page<T>(
        &self,
        transport: &T,
        topic: &str,
        page: usize,
    ) -> Result<ParsedPage, FetchError>
    where
        T: Transport + ?Sized,
    {
        let url = self.endpoint.page_url(topic, page);
        let mut attempt = 1;
        loop {
            match transport.get(&url).await {
                Ok(body) => return Ok(self.parser.parse(&String::from_utf8_lossy(&body))),
                Err(error) => match self.retry_policy.should_retry(&error, attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next,
                    } => {
                        warn!(
                            worker = self.worker.id(),
                            page,
                            attempt,
                            error = %error,
                            "retrying page fetch"
                        );
                        tokio::time::sleep(delay).await;
                        attempt = next;
                    }
                    RetryDecision::DoNotRetry { reason } => {
                        debug!(page, reason = %reason, "giving up on page");
                        return Err(error);
                    }
                },
            }
        }
    }
}
