//! Catalogue-Scraper main entry point
//!
//! This is the command-line interface for the catalogue scraper.

use anyhow::Context;
use catalogue_scraper::config::{load_config_with_hash, validate, Config};
use catalogue_scraper::crawler::Controller;
use catalogue_scraper::output::{
    default_output_path, format_report, validate_output_path, JsonFileSink, TracingSink,
};
use catalogue_scraper::url::parse_http_url;
use catalogue_scraper::{CrawlOutcome, ScrapeError};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Catalogue-Scraper: a paced catalogue crawler
///
/// Walks a paginated listing, extracts one record per detail page, and
/// writes all records to a JSON file once the crawl completes. While the
/// crawl runs, type `p` to pause, `r` to resume, `c` to cancel, or `s` to
/// show the counters.
#[derive(Parser, Debug)]
#[command(name = "catalogue-scraper")]
#[command(version)]
#[command(about = "A paced catalogue crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file; built-in defaults when omitted
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Export file (defaults to a timestamped file in the output directory)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Override the first listing page
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Always fetch over the network
    #[arg(long)]
    no_cache: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// A line typed on stdin while the crawl runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pause,
    Resume,
    Cancel,
    Status,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "c" | "cancel" => Some(Self::Cancel),
            "s" | "status" => Some(Self::Status),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (cfg, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            Config::default()
        }
    };

    if let Some(start_url) = &cli.start_url {
        config.site.start_url = start_url.clone();
    }
    if cli.no_cache {
        config.http.cache_enabled = false;
    }
    validate(&config).context("invalid configuration after command-line overrides")?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(Path::new(&config.output.directory)));
    validate_output_path(&output).context("invalid export file")?;

    if cli.dry_run {
        handle_dry_run(&config, &output);
        return Ok(());
    }

    handle_crawl(config, output).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalogue_scraper=info,warn"),
            1 => EnvFilter::new("catalogue_scraper=debug,info"),
            2 => EnvFilter::new("catalogue_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, output: &Path) {
    println!("=== Catalogue-Scraper Dry Run ===\n");

    println!("Site:");
    println!("  Start URL: {}", config.site.start_url);
    println!("  Catalogue base: {}", config.site.catalogue_base);
    println!("  Asset base: {}", config.site.asset_base);

    println!("\nHTTP:");
    println!("  Timeout: {}ms", config.http.timeout_ms);
    println!("  User agent: {}", config.http.user_agent);
    if config.http.cache_enabled {
        match config.http.cache_ttl_hours {
            Some(hours) => println!("  Cache: {} (expires after {}h)", config.http.cache_dir, hours),
            None => println!("  Cache: {} (never expires)", config.http.cache_dir),
        }
    } else {
        println!("  Cache: disabled");
    }

    println!("\nPacing:");
    println!(
        "  Delay: {}ms to {}ms",
        config.pacing.min_delay_ms, config.pacing.max_delay_ms
    );

    println!("\nOutput:");
    println!("  Export file: {}", output.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, output: PathBuf) -> anyhow::Result<()> {
    let start_url = parse_http_url(&config.site.start_url)?;
    let mut controller = Controller::new(config, Arc::new(TracingSink))?;

    tracing::info!("Export file: {}", output.display());
    controller.start_session(start_url, Box::new(JsonFileSink::new(&output)))?;

    match drive(&mut controller).await {
        Ok(outcome) if outcome.is_completed() => {
            tracing::info!(
                "Crawl completed: {} records written to {}",
                outcome.records.len(),
                output.display()
            );
            Ok(())
        }
        Ok(outcome) => {
            tracing::info!(
                "Crawl cancelled after {} records; nothing was exported",
                outcome.records.len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).context("crawl session failed")
        }
    }
}

/// Relays stdin commands and Ctrl+C to the controller until the session ends
async fn drive(controller: &mut Controller) -> Result<CrawlOutcome, ScrapeError> {
    let started = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ticker = tokio::time::interval(Duration::from_millis(200));

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    _ => {
                        stdin_open = false;
                        continue;
                    }
                };
                match Command::parse(&line) {
                    Some(Command::Pause) => controller.request_pause(),
                    Some(Command::Resume) => controller.request_resume(),
                    Some(Command::Cancel) => return cancel(controller).await,
                    Some(Command::Status) => {
                        println!("Status: {}", controller.current_status());
                        println!("{}", format_report(&controller.current_counters(), started.elapsed()));
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("Unknown command '{}' (p, r, c, s)", line.trim()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, cancelling crawl");
                return cancel(controller).await;
            }
            _ = ticker.tick() => {
                if !controller.is_running() {
                    return controller.wait().await;
                }
            }
        }
    }
}

async fn cancel(controller: &mut Controller) -> Result<CrawlOutcome, ScrapeError> {
    controller
        .request_cancel()
        .await?
        .ok_or_else(|| ScrapeError::Task("no crawl session to cancel".to_string()))
}
