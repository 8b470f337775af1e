//! Opt-in PDF fallback for HTML runs.
//!
//! When an HTML harvest leaves a noticeable share of records without an
//! artifact (no HTML source, or the download failed), the operator may retry
//! exactly those records as PDFs once. The plan is only ever offered; it is
//! never executed without an explicit decision.

use tracing::{info, warn};

use super::{ArtifactDownloader, DownloadOutcome};
use crate::harvest::HarvestEntry;
use crate::record::{ArticleRecord, ArtifactFormat};
use crate::transport::Transport;

/// Default unresolved fraction at which the fallback is offered.
pub const DEFAULT_FALLBACK_THRESHOLD: f64 = 0.1;

/// Records eligible for a one-time PDF retry.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPlan {
    records: Vec<ArticleRecord>,
    total: usize,
}

impl FallbackPlan {
    /// Builds a plan from the final entries of an HTML run.
    ///
    /// Returns `None` when `format` is not HTML, when every record was
    /// downloaded, or when the unresolved fraction is below `threshold`.
    #[must_use]
    pub fn for_entries(
        entries: &[HarvestEntry],
        format: ArtifactFormat,
        threshold: f64,
    ) -> Option<Self> {
        if format != ArtifactFormat::Html || entries.is_empty() {
            return None;
        }

        let records: Vec<ArticleRecord> = entries
            .iter()
            .filter(|entry| !entry.outcome.is_success())
            .map(|entry| entry.record.clone())
            .collect();
        if records.is_empty() {
            return None;
        }

        let plan = Self {
            records,
            total: entries.len(),
        };
        (plan.fraction() >= threshold).then_some(plan)
    }

    /// Titles of the records the retry would cover, in result order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.title.as_str())
    }

    /// Records the retry would cover.
    #[must_use]
    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    /// Number of records the retry would cover.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; empty plans are never built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Share of the run's records left without an artifact.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        self.records.len() as f64 / self.total as f64
    }

    /// Downloads every planned record as PDF, sequentially.
    ///
    /// Returns one outcome per planned record, in plan order.
    pub async fn execute<T>(
        &self,
        downloader: &ArtifactDownloader,
        transport: &T,
    ) -> Vec<DownloadOutcome>
    where
        T: Transport + ?Sized,
    {
        let mut outcomes = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let outcome = downloader
                .download(transport, record, ArtifactFormat::Pdf)
                .await;
            if let DownloadOutcome::Failed(error) = &outcome {
                warn!(title = %record.title, error = %error, "PDF fallback failed");
            }
            outcomes.push(outcome);
        }
        info!(
            retried = outcomes.len(),
            succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
            "PDF fallback finished"
        );
        outcomes
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::download::DownloadError;
    use crate::transport::FetchError;

    fn entry(title: &str, outcome: DownloadOutcome) -> HarvestEntry {
        HarvestEntry {
            record: ArticleRecord {
                title: title.to_string(),
                authors: Vec::new(),
                abstract_text: String::new(),
                pdf_source: Some(format!("https://arxiv.org/pdf/{title}")),
                html_source: None,
            },
            outcome,
        }
    }

    fn ok(title: &str) -> HarvestEntry {
        entry(title, DownloadOutcome::Success(PathBuf::from(title)))
    }

    #[test]
    fn test_plan_lists_skipped_and_failed_records() {
        let entries = vec![
            ok("a"),
            entry("b", DownloadOutcome::SkippedNoSource),
            ok("c"),
            entry(
                "d",
                DownloadOutcome::Failed(DownloadError::from(FetchError::timeout("u"))),
            ),
        ];
        let plan = FallbackPlan::for_entries(&entries, ArtifactFormat::Html, 0.1).unwrap();
        assert_eq!(plan.titles().collect::<Vec<_>>(), vec!["b", "d"]);
        assert!((plan.fraction() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_plan_for_pdf_runs() {
        let entries = vec![entry("b", DownloadOutcome::SkippedNoSource)];
        assert!(FallbackPlan::for_entries(&entries, ArtifactFormat::Pdf, 0.0).is_none());
    }

    #[test]
    fn test_no_plan_below_threshold() {
        let mut entries: Vec<HarvestEntry> = (0..19).map(|i| ok(&i.to_string())).collect();
        entries.push(entry("x", DownloadOutcome::SkippedNoSource));
        assert!(FallbackPlan::for_entries(&entries, ArtifactFormat::Html, 0.1).is_none());
        assert!(FallbackPlan::for_entries(&entries, ArtifactFormat::Html, 0.05).is_some());
    }

    #[test]
    fn test_no_plan_when_everything_downloaded() {
        let entries = vec![ok("a"), ok("b")];
        assert!(FallbackPlan::for_entries(&entries, ArtifactFormat::Html, 0.0).is_none());
    }
}
