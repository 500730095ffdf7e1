//! bench-board CLI - Leaderboard scoring and export
//!
//! Recomputes a benchmark leaderboard from a JSON payload under a set of
//! filters, and prints, exports, or renders the result.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use bench_board::{
    coordinator::{FilterCoordinator, FilterEvent},
    data::LeaderboardPayload,
    export::{self, ExportOptions},
    html,
};

/// bench-board: Hierarchical benchmark leaderboard engine
#[derive(Parser, Debug)]
#[command(name = "bench-board")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recompute scores and print the ranked leaderboard
    Score(ScoreArgs),

    /// Export the leaderboard as a CSV/ZIP archive
    Export(ExportArgs),

    /// Render the leaderboard grid as a static HTML page
    Html(HtmlArgs),
}

#[derive(Parser, Debug)]
struct ScoreArgs {
    /// Path to the leaderboard payload JSON file
    #[arg(short, long, value_name = "FILE", default_value = "leaderboard.json")]
    payload: PathBuf,

    /// Filter expression as a URL query string
    /// (e.g. "excluded_benchmarks=bench_a,bench_b&min_score=0.3")
    #[arg(short, long)]
    filters: Option<String>,

    /// Number of rows to print
    #[arg(short, long, default_value = "20")]
    limit: usize,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Path to the leaderboard payload JSON file
    #[arg(short, long, value_name = "FILE", default_value = "leaderboard.json")]
    payload: PathBuf,

    /// Filter expression as a URL query string
    #[arg(short, long)]
    filters: Option<String>,

    /// Output archive path
    #[arg(short, long, default_value = "leaderboard.zip")]
    output: PathBuf,

    /// Include every benchmark column, not just the top-level ones
    #[arg(long, default_value = "false")]
    expand_all: bool,

    /// Effective date range of the data, as "YYYY-MM-DD:YYYY-MM-DD"
    #[arg(long)]
    date_range: Option<String>,
}

#[derive(Parser, Debug)]
struct HtmlArgs {
    /// Path to the leaderboard payload JSON file
    #[arg(short, long, value_name = "FILE", default_value = "leaderboard.json")]
    payload: PathBuf,

    /// Filter expression as a URL query string
    #[arg(short, long)]
    filters: Option<String>,

    /// Output HTML path
    #[arg(short, long, default_value = "leaderboard.html")]
    output: PathBuf,

    /// Page title
    #[arg(long, default_value = "Benchmark Leaderboard")]
    title: String,

    /// Include every benchmark column, not just the top-level ones
    #[arg(long, default_value = "false")]
    expand_all: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Score(args) => score_command(args),
        Commands::Export(args) => export_command(args),
        Commands::Html(args) => html_command(args),
    }
}

fn load_coordinator(
    payload_path: &Path,
    filters: Option<&str>,
    expand_all: bool,
) -> Result<FilterCoordinator> {
    info!("Loading leaderboard payload from {:?}", payload_path);
    let payload = LeaderboardPayload::load_from_file(payload_path)
        .with_context(|| format!("Failed to load payload: {payload_path:?}"))?;
    debug!(
        rows = payload.rows.len(),
        trees = payload.benchmarks.len(),
        "payload loaded"
    );

    let mut coordinator =
        FilterCoordinator::new(payload).with_context(|| "Failed to build coordinator")?;

    if expand_all {
        coordinator.submit(FilterEvent::ExpandAll, Instant::now());
    }
    if let Some(query) = filters {
        coordinator.submit(FilterEvent::UrlLoaded(query.to_string()), Instant::now());
    }
    coordinator.flush();
    Ok(coordinator)
}

fn score_command(args: ScoreArgs) -> Result<()> {
    let coordinator = load_coordinator(&args.payload, args.filters.as_deref(), false)?;
    let view = coordinator.view();

    println!("{:<5} {:<40} {:<20} {:>10}", "Rank", "Model", "Submitter", "Score");
    for (position, row) in view.rows.iter().take(args.limit).enumerate() {
        let score = match row.effective_score() {
            Some(v) => format!("{v:.3}"),
            None => "X".to_string(),
        };
        println!(
            "{:<5} {:<40} {:<20} {:>10}",
            position + 1,
            row.model.name,
            row.model.submitter,
            score
        );
    }
    info!(
        shown = view.rows.len().min(args.limit),
        total = view.rows.len(),
        "leaderboard printed"
    );
    Ok(())
}

fn export_command(args: ExportArgs) -> Result<()> {
    let coordinator = load_coordinator(&args.payload, args.filters.as_deref(), args.expand_all)?;

    let mut opts = ExportOptions::now();
    if let Some(ref spec) = args.date_range {
        opts.date_range = Some(parse_date_range(spec)?);
    }

    export::write_archive(&args.output, coordinator.view(), coordinator.hierarchy(), &opts)
        .with_context(|| format!("Failed to write archive: {:?}", args.output))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn html_command(args: HtmlArgs) -> Result<()> {
    let coordinator = load_coordinator(&args.payload, args.filters.as_deref(), args.expand_all)?;

    html::render_to_file(
        &args.output,
        coordinator.view(),
        coordinator.hierarchy(),
        &args.title,
    )
    .with_context(|| format!("Failed to render HTML: {:?}", args.output))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

/// Parse a "YYYY-MM-DD:YYYY-MM-DD" range into UTC day bounds
fn parse_date_range(
    spec: &str,
) -> Result<(chrono::DateTime<Utc>, chrono::DateTime<Utc>)> {
    let (from, to) = spec
        .split_once(':')
        .with_context(|| format!("Invalid date range (expected from:to): {spec}"))?;
    let parse_day = |s: &str| -> Result<chrono::DateTime<Utc>> {
        let date = chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {s}"))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .with_context(|| format!("Invalid date: {s}"))?;
        Ok(Utc.from_utc_datetime(&midnight))
    };
    let from = parse_day(from)?;
    let to = parse_day(to)?;
    if to < from {
        anyhow::bail!("Date range end precedes start: {spec}");
    }
    Ok((from, to))
}
