use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use rink_scraper::common::types::RinkIdentity;
use rink_scraper::config::Config;
use rink_scraper::geocode::{GeocodeCache, Origin, ProviderChain};
use rink_scraper::logging;
use rink_scraper::pipeline::{Pipeline, RunSummary};

#[derive(Parser)]
#[command(name = "rink_scraper")]
#[command(about = "Montreal outdoor rink conditions scraper")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (defaults to rinks.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the listing, geocode every rink and write the XML snapshot
    Run {
        /// Snapshot to write
        #[arg(long)]
        output: Option<PathBuf>,
        /// Previous snapshot used as the geocode cache (defaults to --output)
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Override the listing URL
        #[arg(long)]
        source_url: Option<String>,
        /// Pause between geocoding rounds, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Resolve a single rink through the cache and provider chain
    Lookup {
        /// Rink name as it appears in the listing
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        borough: String,
        /// Snapshot used as the geocode cache
        #[arg(long)]
        cache: Option<PathBuf>,
    },
}

fn print_summary(summary: &RunSummary) {
    println!("\n📊 Run results:");
    println!("   Boroughs: {}", summary.boroughs);
    println!("   Rinks: {}", summary.rinks);
    println!("   From cache: {}", summary.cache_hits);
    println!("   Resolved by Nominatim: {}", summary.primary_hits);
    println!("   Resolved by Google: {}", summary.secondary_hits);
    println!("   Unresolved: {}", summary.unresolved);
    println!("   Output file: {}", summary.output_file.display());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let _log_guard = logging::init_logging(&config.logging).context("initializing logging")?;

    match cli.command {
        Commands::Run {
            output,
            cache,
            source_url,
            delay_ms,
        } => {
            if let Some(output) = output {
                config.snapshot.path = output;
            }
            if cache.is_some() {
                config.snapshot.cache_path = cache;
            }
            if let Some(url) = source_url {
                config.source.url = url;
            }
            if let Some(delay_ms) = delay_ms {
                config.geocoding.politeness_delay_ms = delay_ms;
            }

            println!("🚀 Running rink scraper...");
            let mut pipeline = Pipeline::from_config(&config)?;
            match pipeline.run().await {
                Ok(summary) => {
                    info!("Run finished");
                    print_summary(&summary);
                }
                Err(e) => {
                    error!("Run failed: {}", e);
                    println!("❌ Run failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Lookup {
            name,
            borough,
            cache,
        } => {
            let cache_path = cache.unwrap_or_else(|| config.snapshot.cache_source().to_path_buf());
            let cache = GeocodeCache::from_snapshot(&cache_path);
            let mut chain = ProviderChain::from_config(&config.geocoding, cache)?;

            let identity = RinkIdentity::new(name, borough);
            let resolution = chain.resolve_with_origin(&identity).await;
            let record = &resolution.record;
            if resolution.origin == Origin::Unresolved {
                println!("⚠️  No address found for {}", identity.name);
            } else {
                println!("📍 {} ({:?})", identity.name, resolution.origin);
                println!("   Address: {}", record.display_name);
                if let (Some(lat), Some(lon)) = (record.latitude, record.longitude) {
                    println!("   Coordinates: {}, {}", lat, lon);
                }
                if !record.borough_hint.is_empty() {
                    println!("   Borough: {}", record.borough_hint);
                }
            }
        }
    }
    Ok(())
}
