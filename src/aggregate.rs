//! Merging per-worker results into one ordered, deduplicated sequence.
//!
//! Results are concatenated in ascending worker id (never arrival order),
//! records sharing a normalized title keep only their first occurrence, and
//! the merged sequence is truncated to the requested amount.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::harvest::{HarvestEntry, HarvestResult};
use crate::record::ArticleRecord;

/// The coordinator's view of a finished run.
#[derive(Debug, Default)]
pub struct Aggregate {
    /// Final entries in global order.
    pub entries: Vec<HarvestEntry>,
    /// Records dropped as title duplicates.
    pub duplicates: usize,
    /// Records dropped by truncation to the requested amount.
    pub truncated: usize,
    /// Pages fetched successfully across all workers.
    pub pages_fetched: usize,
    /// Failed page fetches across all workers.
    pub failed_pages: usize,
    /// Workers that stopped on the end-of-results signal.
    pub exhausted_workers: usize,
}

impl Aggregate {
    /// Final records in global order.
    pub fn records(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }

    /// Number of final records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the run produced no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Successful downloads among the final records.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.count(|entry| entry.outcome.is_success())
    }

    /// Final records without a source for the requested format.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|entry| entry.outcome.is_skipped())
    }

    /// Final records whose download failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|entry| entry.outcome.is_failed())
    }

    fn count(&self, predicate: impl Fn(&HarvestEntry) -> bool) -> usize {
        self.entries.iter().filter(|entry| predicate(entry)).count()
    }
}

/// Normalizes a title for duplicate detection.
///
/// Case-insensitive, with whitespace runs collapsed. Titles differing only
/// in letter case are treated as the same article.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Merges worker results into the final ordered sequence of at most `amount` entries.
#[must_use]
pub fn aggregate(mut results: Vec<HarvestResult>, amount: usize) -> Aggregate {
    results.sort_by_key(|result| result.worker.id());

    let mut seen = HashSet::new();
    let mut merged = Aggregate::default();

    for result in results {
        merged.pages_fetched += result.pages_fetched;
        merged.failed_pages += result.failed_pages;
        merged.exhausted_workers += usize::from(result.exhausted);
        for entry in result.entries {
            if seen.insert(normalize_title(&entry.record.title)) {
                merged.entries.push(entry);
            } else {
                debug!(
                    worker = result.worker.id(),
                    title = %entry.record.title,
                    "dropping duplicate title"
                );
                merged.duplicates += 1;
            }
        }
    }

    if merged.entries.len() > amount {
        merged.truncated = merged.entries.len() - amount;
        merged.entries.truncate(amount);
    }

    info!(
        records = merged.entries.len(),
        duplicates = merged.duplicates,
        truncated = merged.truncated,
        exhausted_workers = merged.exhausted_workers,
        "aggregated worker results"
    );
    merged
}
