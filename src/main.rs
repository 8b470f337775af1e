//! CLI entry point for the arxiv-harvester tool.

use std::io::{self, BufRead, IsTerminal, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use harvester_core::{
    ArtifactFormat, Coordinator, DEFAULT_FALLBACK_THRESHOLD, FallbackPlan, HarvestConfig,
    ResultPageParser, RetryPolicy, RunParams, RunReport, SearchEndpoint, TransportSettings,
};
use tracing::{debug, info, warn};

mod cli;
mod config;

use cli::{Args, FallbackChoice};
use config::FileConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let loaded = config::load_config(args.config.as_deref())?;
    if loaded.loaded_from_file
        && let Some(path) = &loaded.path
    {
        info!(path = %path.display(), "Loaded config file");
    }
    let file = loaded.config;

    let params = resolve_run_params(&args, &file)?;
    let harvest_config = build_harvest_config(&args, &file)?;
    debug!(?harvest_config, "Resolved harvest configuration");

    info!(
        topic = %params.topic,
        amount = params.amount,
        format = %params.format,
        workers = harvest_config.workers,
        "Harvester starting"
    );

    let started = Instant::now();
    let coordinator = Coordinator::new(harvest_config);
    let report = coordinator.run(params).await.context("Harvest run failed")?;

    log_summary(&report);

    if let Some(plan) = &report.fallback {
        if confirm_fallback(plan, args.fallback_choice())? {
            let outcomes = coordinator
                .run_fallback(plan)
                .await
                .context("PDF fallback failed")?;
            info!(
                retried = outcomes.len(),
                succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
                skipped = outcomes.iter().filter(|o| o.is_skipped()).count(),
                failed = outcomes.iter().filter(|o| o.is_failed()).count(),
                "PDF fallback complete"
            );
        } else {
            info!(records = plan.len(), "PDF fallback declined");
        }
    }

    info!(
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Total time"
    );
    Ok(())
}

/// Topic and amount come from the command line, or from a terminal prompt.
fn resolve_run_params(args: &Args, file: &FileConfig) -> Result<RunParams> {
    let interactive = io::stdin().is_terminal();

    let topic = match args.topic.as_deref().map(str::trim) {
        Some(topic) if !topic.is_empty() => topic.to_string(),
        Some(_) => bail!("Topic must not be empty"),
        None if interactive => prompt_topic()?,
        None => bail!("No topic given. Pass TOPIC or run from a terminal to be prompted."),
    };

    let amount = match args.amount {
        Some(amount) => usize::try_from(amount).context("Amount does not fit this platform")?,
        None if interactive => prompt_amount(&topic)?,
        None => bail!("No amount given. Pass -n AMOUNT or run from a terminal to be prompted."),
    };

    let format = args.format.or(file.format).unwrap_or(ArtifactFormat::Pdf);

    Ok(RunParams {
        topic,
        amount,
        format,
    })
}

/// Layers flags over file values over built-in defaults.
fn build_harvest_config(args: &Args, file: &FileConfig) -> Result<HarvestConfig> {
    let mut config = HarvestConfig::default();

    if let Some(output_dir) = args.output_dir.clone().or_else(|| file.output_dir.clone()) {
        config.output_dir = output_dir;
    }
    if let Some(workers) = args.workers.or(file.workers) {
        config.workers = usize::from(workers);
    }

    config.transport = TransportSettings {
        connect_timeout: args
            .connect_timeout
            .or(file.connect_timeout_secs)
            .map(Duration::from_secs),
        request_timeout: args
            .timeout
            .or(file.request_timeout_secs)
            .map(Duration::from_secs),
    };

    if let Some(attempts) = args.page_attempts.or(file.page_attempts) {
        config.retry_policy = RetryPolicy::with_max_attempts(attempts);
    }
    config.collision = args.on_collision.or(file.on_collision).unwrap_or_default();
    config.fallback_threshold = file
        .fallback_threshold
        .unwrap_or(DEFAULT_FALLBACK_THRESHOLD);

    if let Some(url) = &file.search_base_url {
        config.endpoint = SearchEndpoint::new(url)
            .with_context(|| format!("Invalid search_base_url '{url}'"))?;
    }
    if let Some(url) = &file.site_base_url {
        config.parser = ResultPageParser::new(url)
            .with_context(|| format!("Invalid site_base_url '{url}'"))?;
    }

    Ok(config)
}

fn log_summary(report: &RunReport) {
    let aggregate = &report.aggregate;
    if report.is_empty() {
        warn!(
            metadata = %report.metadata_path.display(),
            "No articles matched the topic; wrote an empty metadata document"
        );
        return;
    }

    info!(
        records = aggregate.len(),
        downloaded = aggregate.downloaded(),
        skipped = aggregate.skipped(),
        failed = aggregate.failed(),
        duplicates = aggregate.duplicates,
        pages = aggregate.pages_fetched,
        failed_pages = aggregate.failed_pages,
        exhausted_workers = aggregate.exhausted_workers,
        metadata = %report.metadata_path.display(),
        "Harvest complete"
    );
}

fn confirm_fallback(plan: &FallbackPlan, choice: FallbackChoice) -> Result<bool> {
    match choice {
        FallbackChoice::Accept => return Ok(true),
        FallbackChoice::Decline => return Ok(false),
        FallbackChoice::Ask => {}
    }

    if !io::stdin().is_terminal() {
        info!("Not a terminal; skipping PDF fallback prompt (use --yes-fallback to accept)");
        return Ok(false);
    }

    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "{} of the harvested articles ({:.0}%) have no HTML rendition:",
        plan.len(),
        plan.fraction() * 100.0
    )?;
    for title in plan.titles() {
        writeln!(stdout, "  - {title}")?;
    }
    let answer = prompt_line(&mut stdout, "Download these as PDF instead? [y/N]: ")?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn prompt_topic() -> Result<String> {
    let mut stdout = io::stdout().lock();
    loop {
        let topic = prompt_line(&mut stdout, "Which topic should be harvested?: ")?;
        if !topic.is_empty() {
            return Ok(topic);
        }
        writeln!(stdout, "Please enter a non-empty topic.")?;
    }
}

fn prompt_amount(topic: &str) -> Result<usize> {
    let mut stdout = io::stdout().lock();
    loop {
        let raw = prompt_line(
            &mut stdout,
            &format!("How many articles about \"{topic}\" should be collected?: "),
        )?;
        match raw.parse::<usize>() {
            Ok(amount) if amount > 0 => return Ok(amount),
            _ => writeln!(stdout, "Please enter a positive whole number.")?,
        }
    }
}

fn prompt_line(stdout: &mut impl Write, prompt: &str) -> Result<String> {
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        bail!("Input closed before an answer was given");
    }
    Ok(line.trim().to_string())
}
