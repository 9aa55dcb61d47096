//! aqmaps - plan one day's sensor survey flight and write the outputs.

use anyhow::{anyhow, Context, Result};
use aqmaps_cli::{output, MapServerClient};
use aqmaps_core::{FlightPlanner, PlannerConfig, Position};
use chrono::NaiveDate;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, allow_negative_numbers = true)]
struct Args {
    /// Day of the survey (1-31)
    day: u32,

    /// Month of the survey (1-12)
    month: u32,

    /// Year of the survey
    year: i32,

    /// Launch latitude
    latitude: f64,

    /// Launch longitude
    longitude: f64,

    /// Random seed (accepted for compatibility; planning is deterministic)
    seed: u64,

    /// Port of the map web server on localhost
    port: u16,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("aqmaps=info".parse()?))
        .init();

    let args = Args::parse();
    let date = NaiveDate::from_ymd_opt(args.year, args.month, args.day).ok_or_else(|| {
        anyhow!("{:02}/{:02}/{} is not a valid date", args.day, args.month, args.year)
    })?;
    tracing::info!(%date, seed = args.seed, port = args.port, "Planning survey");

    let config = PlannerConfig::from_env().context("Invalid planner configuration")?;
    let client = MapServerClient::localhost(args.port)?;

    let targets = client
        .load_targets(date)
        .with_context(|| format!("Failed to load sensors for {}", date))?;
    let zones = client
        .fetch_no_fly_zones()
        .context("Failed to load no-fly zones")?;
    tracing::info!(sensors = targets.len(), zones = zones.len(), "Map data loaded");

    let planner = FlightPlanner::new(config, zones)?;
    let start = Position::new(args.longitude, args.latitude);
    let plan = planner.plan(&targets, start)?;

    let (readings, log) = output::write_outputs(Path::new("."), date, &plan)?;
    tracing::info!(
        moves = plan.total_moves(),
        visited = plan.visited.len(),
        skipped = plan.skipped.len(),
        "Wrote {} and {}",
        readings.display(),
        log.display()
    );

    Ok(())
}
