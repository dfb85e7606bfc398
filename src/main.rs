//! Sumi-Seek main entry point
//!
//! This is the command-line interface for the Sumi-Seek crawler and search engine.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use sumi_seek::config::{load_config_with_hash, validate, Config};
use sumi_seek::crawler::run_crawl;
use sumi_seek::log::{export_csv, import_csv, open_log};
use sumi_seek::output::{format_results, load_statistics, print_crawl_summary, print_statistics};
use sumi_seek::{SearchEngine, Tokenizer};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Sumi-Seek: a resumable crawl-then-search engine
///
/// Sumi-Seek crawls pages reachable from a set of seed URLs into a durable
/// crawl log, then answers free-text queries against an index built from it.
#[derive(Parser, Debug)]
#[command(name = "sumi-seek")]
#[command(version)]
#[command(about = "A resumable crawl-then-search engine", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl from the configured seeds, resuming from the crawl log
    Crawl(CrawlArgs),

    /// Search the crawled pages
    Search {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Run a single query instead of the interactive prompt
        #[arg(long)]
        query: Option<String>,
    },

    /// Show statistics from the crawl log
    Stats {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Export the crawl log as CSV (URL, Title, Meta Description)
    Export {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Destination CSV file
        #[arg(value_name = "CSV")]
        output: PathBuf,
    },

    /// Import records from a CSV file into the crawl log
    Import {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Source CSV file
        #[arg(value_name = "CSV")]
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Additional seed URL (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Maximum extractions in flight
    #[arg(long)]
    concurrency: Option<u32>,

    /// Maximum extractions in flight per host
    #[arg(long)]
    per_host: Option<u32>,

    /// Minimum delay between requests to one host (milliseconds)
    #[arg(long, value_name = "MS")]
    min_delay: Option<u64>,

    /// Maximum delay between requests to one host (milliseconds)
    #[arg(long, value_name = "MS")]
    max_delay: Option<u64>,

    /// Stop after recording this many pages
    #[arg(long)]
    max_pages: Option<u64>,
}

impl CrawlArgs {
    fn apply(&self, config: &mut Config) {
        config.seeds.extend(self.seeds.iter().cloned());

        let crawler = &mut config.crawler;
        if let Some(concurrency) = self.concurrency {
            crawler.max_concurrent_extractions = concurrency;
        }
        if let Some(per_host) = self.per_host {
            crawler.max_concurrent_per_host = per_host;
        }
        if let Some(min_delay) = self.min_delay {
            crawler.min_delay_ms = min_delay;
        }
        if let Some(max_delay) = self.max_delay {
            crawler.max_delay_ms = max_delay;
        }
        if let Some(max_pages) = self.max_pages {
            crawler.max_pages = Some(max_pages);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl(args) => handle_crawl(args).await,
        Command::Search { config, query } => handle_search(&config, query.as_deref()).await,
        Command::Stats { config } => handle_stats(&config),
        Command::Export { config, output } => handle_export(&config, &output),
        Command::Import { config, input } => handle_import(&config, &input),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_seek=info,warn"),
            1 => EnvFilter::new("sumi_seek=debug,info"),
            2 => EnvFilter::new("sumi_seek=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(io::stderr)
        .init();
}

fn load(path: &Path) -> Result<(Config, String)> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::debug!("Configuration loaded (hash: {})", hash);
    Ok((config, hash))
}

/// Handles the crawl command
async fn handle_crawl(args: CrawlArgs) -> Result<()> {
    let (mut config, config_hash) = load(&args.config)?;
    args.apply(&mut config);
    validate(&config).context("Invalid crawler settings")?;

    tracing::info!(
        "Crawling with {} seeds, {} workers ({} per host)",
        config.seeds.len(),
        config.crawler.max_concurrent_extractions,
        config.crawler.max_concurrent_per_host
    );

    let shutdown = async {
        ctrl_c().await;
        tracing::info!("Received Ctrl-C, stopping crawl");
    };

    let summary = run_crawl(&config, &config_hash, shutdown)
        .await
        .context("Crawl failed")?;

    print_crawl_summary(&summary);
    Ok(())
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Handles the search command
///
/// The interactive prompt ends on `exit`, `quit`, end of input or Ctrl-C.
async fn handle_search(config_path: &Path, query: Option<&str>) -> Result<()> {
    let (config, _) = load(config_path)?;

    let tokenizer = Tokenizer::from_file(Path::new(&config.search.stopwords_path))?;
    let log = open_log(Path::new(&config.storage.database_path)).with_context(|| {
        format!("Failed to open crawl log {}", config.storage.database_path)
    })?;
    let engine = SearchEngine::from_log(&log, tokenizer)?;

    if let Some(query) = query {
        print!("{}", format_results(&engine.search(query)));
        return Ok(());
    }

    // Blocking stdin reads live on their own thread so Ctrl-C can end the prompt
    let (tx, mut lines) = mpsc::channel::<io::Result<String>>(1);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    search_prompt(&engine, &mut lines, ctrl_c(), &mut io::stdout()).await
}

/// Answers queries read from `lines` until `exit`, `quit`, end of input or `stop`
async fn search_prompt<F, W>(
    engine: &SearchEngine,
    lines: &mut mpsc::Receiver<io::Result<String>>,
    stop: F,
    out: &mut W,
) -> Result<()>
where
    F: Future<Output = ()>,
    W: Write,
{
    tokio::pin!(stop);

    loop {
        write!(out, "\nEnter search query (or type 'exit' to quit): ")?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.recv() => line.transpose()?,
            _ = &mut stop => None,
        };
        let Some(line) = line else {
            writeln!(out)?;
            break;
        };
        let query = line.trim();

        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }

        writeln!(out)?;
        write!(out, "{}", format_results(&engine.search(query)))?;
    }

    Ok(())
}

/// Handles the stats command
fn handle_stats(config_path: &Path) -> Result<()> {
    let (config, _) = load(config_path)?;

    println!("Crawl log: {}\n", config.storage.database_path);
    let log = open_log(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&log)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the export command
fn handle_export(config_path: &Path, output: &Path) -> Result<()> {
    let (config, _) = load(config_path)?;

    let log = open_log(Path::new(&config.storage.database_path))?;
    let count = export_csv(&log, output)
        .with_context(|| format!("Failed to export to {}", output.display()))?;

    println!("✓ Exported {} records to {}", count, output.display());
    Ok(())
}

/// Handles the import command
fn handle_import(config_path: &Path, input: &Path) -> Result<()> {
    let (config, _) = load(config_path)?;

    let log = open_log(Path::new(&config.storage.database_path))?;
    let summary = import_csv(&log, input)
        .with_context(|| format!("Failed to import {}", input.display()))?;

    println!(
        "✓ Imported {} records ({} already present, {} skipped)",
        summary.imported, summary.duplicates, summary.skipped
    );
    Ok(())
}
