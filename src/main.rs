use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use poi_sweep::output::{self, OutputFormat};
use poi_sweep::{BoundingBox, RateLimiter, RegionSearcher, SweepConfig, TomTomClient};

/// Collect every charging station (or other POI category) inside a region
/// from the TomTom search API.
#[derive(Debug, Parser)]
#[command(name = "poi-sweep", version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level and print configuration details
    #[arg(short, long)]
    verbose: bool,

    /// TomTom API key
    #[arg(long, env = "TOMTOM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Country code filter, e.g. DE
    #[arg(long)]
    country: Option<String>,

    /// POI category id (7309 = EV charging stations)
    #[arg(long)]
    category: Option<u32>,

    /// Minimum connector power in kW
    #[arg(long)]
    min_power: Option<f64>,

    /// Results per query (at most 100)
    #[arg(long)]
    limit: Option<u32>,

    /// Root region as north,west,south,east
    #[arg(long, allow_hyphen_values = true)]
    bounds: Option<BoundingBox>,

    /// Output path without extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Which output files to write
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

impl Cli {
    /// Command-line flags take precedence over file and environment settings
    fn apply_to(&self, config: &mut SweepConfig) {
        if let Some(api_key) = &self.api_key {
            config.api.api_key = Some(api_key.clone());
        }
        if let Some(country) = &self.country {
            config.search.country = country.clone();
        }
        if let Some(category) = self.category {
            config.search.category = category;
        }
        if let Some(min_power) = self.min_power {
            config.search.min_power_kw = min_power;
        }
        if let Some(limit) = self.limit {
            config.search.limit = limit;
        }
        if let Some(bounds) = self.bounds {
            config.search.bounds = bounds;
        }
        if let Some(output) = &self.output {
            config.output.basename = output.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = SweepConfig::load_from_path(cli.config.clone())?;
    cli.apply_to(&mut config);
    config.validate()?;

    poi_sweep::telemetry::init(&config.logging, cli.verbose)?;

    if cli.verbose {
        let config_path = cli
            .config
            .clone()
            .or_else(SweepConfig::get_config_path)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "defaults".to_string());
        println!("Using config from: {config_path}");
        println!("Search: {:?}", config.search_filter());
        println!("Bounds: {}", config.search.bounds);
        println!("Rate limit: {} ms between queries", config.rate_limit.min_interval_ms);
        println!("Log level: {}", config.logging.level);
    }

    let api_key = config.require_api_key()?;
    let client = TomTomClient::new(api_key, &config.api)?;
    let rate_limiter = Arc::new(RateLimiter::new(config.min_interval()));
    let searcher = RegionSearcher::new(client, rate_limiter).with_options(config.sweep_options());

    info!("Starting sweep over {}", config.search.bounds);
    let report = searcher
        .sweep(&config.search.bounds, &config.search_filter())
        .await;

    output::verify_completeness(&report.records, report.root_total);
    for failed in &report.failed_regions {
        warn!("Region {} returned no data: {}", failed.bbox, failed.error);
    }

    let written = output::write_outputs(
        &report.records,
        &config.output.basename,
        config.output.format,
    )
    .with_context(|| {
        format!(
            "Failed to write results to {}",
            config.output.basename.display()
        )
    })?;

    println!(
        "Collected {} records in {} queries ({}s)",
        report.records.len(),
        report.queries,
        report.duration().num_seconds()
    );
    if !report.is_complete() {
        println!(
            "Warning: sweep incomplete ({} failed regions, {} truncated regions, {} missing)",
            report.failed_regions.len(),
            report.truncated_regions.len(),
            report.missing().map_or_else(|| "unknown".to_string(), |m| m.to_string())
        );
    }
    for path in written {
        println!("Output created: {}", path.display());
    }

    Ok(())
}
