//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use harvester_core::{ArtifactFormat, CollisionPolicy};

/// Harvest the most recent arXiv articles for a topic.
///
/// Collects up to AMOUNT articles matching TOPIC, newest first, saves each
/// article's PDF or HTML rendition into the output directory and writes a
/// `metadata.json` describing them.
#[derive(Parser, Debug)]
#[command(name = "arxiv-harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Search topic (prompted for when omitted on a terminal)
    pub topic: Option<String>,

    /// Number of articles to collect
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub amount: Option<u32>,

    /// Artifact format to download [default: pdf]
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<ArtifactFormat>,

    /// Directory for artifacts and metadata.json [default: output]
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Number of concurrent workers (1-64) [default: 4]
    ///
    /// Each worker keeps at most ceil(AMOUNT / WORKERS) articles from its own
    /// result pages, so a small amount spread over many workers can return
    /// fewer articles than requested.
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub workers: Option<u8>,

    /// Per-request timeout in seconds (1-3600, unset by default)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Attempts per result page for transient failures (1-10) [default: 1]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub page_attempts: Option<u32>,

    /// What to do when an artifact filename already exists
    #[arg(long, value_enum)]
    pub on_collision: Option<CollisionPolicy>,

    /// Accept the PDF fallback for HTML runs without asking
    #[arg(long, conflicts_with = "no_fallback")]
    pub yes_fallback: bool,

    /// Decline the PDF fallback for HTML runs without asking
    #[arg(long)]
    pub no_fallback: bool,

    /// Read defaults from this config file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Operator decision on a PDF fallback offer, from flags alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackChoice {
    /// Retry without asking.
    Accept,
    /// Skip without asking.
    Decline,
    /// Ask on the terminal.
    Ask,
}

impl Args {
    /// Fallback decision implied by `--yes-fallback` / `--no-fallback`.
    #[must_use]
    pub fn fallback_choice(&self) -> FallbackChoice {
        if self.yes_fallback {
            FallbackChoice::Accept
        } else if self.no_fallback {
            FallbackChoice::Decline
        } else {
            FallbackChoice::Ask
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["arxiv-harvester"]).unwrap();
        assert!(args.topic.is_none());
        assert!(args.amount.is_none());
        assert!(args.format.is_none());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.fallback_choice(), FallbackChoice::Ask);
    }

    #[test]
    fn test_cli_full_invocation() {
        let args = Args::try_parse_from([
            "arxiv-harvester",
            "quantum computing",
            "-n",
            "120",
            "-f",
            "html",
            "-o",
            "papers",
            "-w",
            "3",
            "--timeout",
            "30",
            "--on-collision",
            "suffix",
        ])
        .unwrap();
        assert_eq!(args.topic.as_deref(), Some("quantum computing"));
        assert_eq!(args.amount, Some(120));
        assert_eq!(args.format, Some(ArtifactFormat::Html));
        assert_eq!(args.output_dir, Some(PathBuf::from("papers")));
        assert_eq!(args.workers, Some(3));
        assert_eq!(args.timeout, Some(30));
        assert_eq!(args.on_collision, Some(CollisionPolicy::Suffix));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["arxiv-harvester", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["arxiv-harvester", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["arxiv-harvester", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["arxiv-harvester", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_amount_zero_rejected() {
        let err = Args::try_parse_from(["arxiv-harvester", "q", "-n", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_amount_negative_rejected() {
        assert!(Args::try_parse_from(["arxiv-harvester", "q", "-n", "-5"]).is_err());
    }

    #[test]
    fn test_cli_workers_range() {
        let args = Args::try_parse_from(["arxiv-harvester", "-w", "64"]).unwrap();
        assert_eq!(args.workers, Some(64));

        let err = Args::try_parse_from(["arxiv-harvester", "-w", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let err = Args::try_parse_from(["arxiv-harvester", "-w", "65"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_unknown_format_rejected() {
        let err = Args::try_parse_from(["arxiv-harvester", "-f", "epub"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_cli_page_attempts_over_max_rejected() {
        let err = Args::try_parse_from(["arxiv-harvester", "--page-attempts", "11"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_fallback_flags() {
        let args = Args::try_parse_from(["arxiv-harvester", "--yes-fallback"]).unwrap();
        assert_eq!(args.fallback_choice(), FallbackChoice::Accept);

        let args = Args::try_parse_from(["arxiv-harvester", "--no-fallback"]).unwrap();
        assert_eq!(args.fallback_choice(), FallbackChoice::Decline);

        let err = Args::try_parse_from(["arxiv-harvester", "--yes-fallback", "--no-fallback"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
