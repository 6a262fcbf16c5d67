//! Roster-Harvest main entry point
//!
//! This is the command-line interface for the Roster-Harvest catalog harvester.

use clap::Parser;
use roster_harvest::config::{load_config_with_hash, Config};
use roster_harvest::crawler::harvest;
use roster_harvest::output::print_report;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Roster-Harvest: an incremental catalog roster harvester
///
/// Roster-Harvest reads a show's character roster from the catalog site,
/// downloads every character it has not stored yet, and links known
/// characters to the show without refetching them.
#[derive(Parser, Debug)]
#[command(name = "roster-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental catalog roster harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Catalog URL of the show to ingest
    #[arg(value_name = "URL", required_unless_present_any = ["stats", "dry_run"])]
    url: Option<String>,

    /// Refetch and replace characters that are already stored
    #[arg(long)]
    overwrite: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be fetched without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
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

    if cli.dry_run {
        handle_dry_run(&config, cli.url.as_deref())?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(url) = cli.url.as_deref() {
        handle_ingest(&config, &config_hash, url, cli.overwrite).await?;
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
            0 => EnvFilter::new("roster_harvest=info,warn"),
            1 => EnvFilter::new("roster_harvest=debug,info"),
            2 => EnvFilter::new("roster_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and resolves the URL offline
fn handle_dry_run(config: &Config, url: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    use roster_harvest::url::CatalogSite;

    println!("=== Roster-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Politeness unit: {}ms", config.politeness.unit_ms);

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Max retries: {}", config.fetch.max_retries);
    println!("  Retry delay: {}ms", config.fetch.retry_delay_ms);
    println!("  On character error: {:?}", config.ingest.on_character_error);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");

    if let Some(url) = url {
        let site = CatalogSite::new(&config.site.base_url)?;
        let show = site.resolve_show(url)?;
        println!(
            "✓ Would ingest {} {} from {}",
            show.kind,
            show.mal_id,
            site.roster_url(&show)
        );
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use roster_harvest::output::{load_statistics, print_statistics};
    use roster_harvest::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main ingest operation
async fn handle_ingest(
    config: &Config,
    config_hash: &str,
    url: &str,
    overwrite: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if overwrite {
        tracing::info!("Ingesting {} (overwriting stored characters)", url);
    } else {
        tracing::info!("Ingesting {}", url);
    }

    match harvest(config, config_hash, url, overwrite).await {
        Ok(report) => {
            tracing::info!("Ingest completed successfully");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Ingest failed: {}", e);
            Err(e.into())
        }
    }
}
