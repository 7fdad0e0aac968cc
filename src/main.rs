//! Wordwatch main entry point
//!
//! This is the command-line interface for the Wordwatch front-page tracker.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wordwatch::config::{load_config_with_hash, resolve_sites, Config};
use wordwatch::crawler::{crawl, ScheduleGuard, SiteOutcome};
use wordwatch::output::{parse_answer, PersistDecider};
use wordwatch::storage::{SnapshotStore, SqliteStorage};

/// Wordwatch: a front-page word-use tracker
///
/// Wordwatch visits news front pages, follows their article links one level
/// deep, counts a configured list of terms and keeps a timestamped history
/// of the counts per site.
#[derive(Parser, Debug)]
#[command(name = "wordwatch")]
#[command(version)]
#[command(about = "A front-page word-use tracker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Whether finished snapshots are committed to the database
    #[arg(long, value_enum, default_value_t = PersistArg::Always)]
    persist: PersistArg,

    /// Validate config and show what would be crawled without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the stored site histories and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PersistArg {
    Always,
    Never,
    /// Ask before the first commit and remember the answer
    Ask,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash, cli.persist).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wordwatch=info,warn"),
            1 => EnvFilter::new("wordwatch=debug,info"),
            2 => EnvFilter::new("wordwatch=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Wordwatch Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Freshness window: {} minutes",
        config.crawler.freshness_window_minutes
    );
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);
    println!(
        "  Max concurrent articles: {}",
        config.crawler.max_concurrent_articles
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Include articles: {}", config.crawler.include_articles);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Backups: {}", config.output.backup_dir);

    // The database is only read when it already exists
    let database = Path::new(&config.output.database_path);
    let storage = if database.exists() {
        Some(
            SqliteStorage::new(database)
                .with_context(|| format!("opening database {}", database.display()))?,
        )
    } else {
        None
    };
    let guard = ScheduleGuard::from_config(&config.crawler);
    let now = chrono::Utc::now();

    let sites = resolve_sites(config);
    println!("\nSites ({}):", sites.len());
    let mut valid = 0;
    for entry in &sites {
        match entry {
            Ok(site) => {
                valid += 1;
                let updated_at = match &storage {
                    Some(storage) => storage.get_updated_at(&site.name)?,
                    None => None,
                };
                let status = match updated_at {
                    Some(last) if !guard.is_due(updated_at, now) => {
                        format!("not due before {}", guard.next_eligible(last).to_rfc3339())
                    }
                    Some(_) => "due".to_string(),
                    None => "due (never crawled)".to_string(),
                };
                println!("  - {}: {}", site.describe(), status);
                println!("    terms: {}", site.search_terms.join(", "));
                println!("    title attribute: {}", site.title_attribute);
            }
            Err(e) => println!("  ! {}", e),
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} of {} site entries", valid, sites.len());

    Ok(())
}

/// Handles the --stats mode: shows the stored site histories
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use wordwatch::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("opening database {}", config.output.database_path))?;
    let stats = load_statistics(&storage).context("loading site histories")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    persist: PersistArg,
) -> anyhow::Result<()> {
    tracing::info!(
        "Sites: {}, global terms: {}",
        config.sites.len(),
        config.search_terms.len()
    );

    let decider = match persist {
        PersistArg::Always => PersistDecider::always(),
        PersistArg::Never => PersistDecider::never(),
        PersistArg::Ask => PersistDecider::confirm_once(prompt_persist),
    };

    let report = match crawl(config, config_hash, decider).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    println!("\n=== Run Summary ===\n");
    for site in &report.sites {
        let marker = match site.outcome {
            SiteOutcome::Completed { .. } => "✓",
            SiteOutcome::Skipped { .. } => "-",
            SiteOutcome::Failed { .. } | SiteOutcome::Invalid { .. } => "✗",
        };
        println!("  {} {}: {}", marker, site.site, site.outcome);
    }
    println!(
        "\n{} completed, {} skipped, {} failed",
        report.completed(),
        report.skipped(),
        report.failed()
    );

    Ok(())
}

/// Asks on stdin whether snapshots should be committed
fn prompt_persist(site: &str) -> bool {
    print!(
        "Persist the snapshot of {} and all following sites? (y/n/yy): ",
        site
    );
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => parse_answer(&line),
        Err(e) => {
            tracing::warn!("Could not read answer: {}", e);
            false
        }
    }
}
