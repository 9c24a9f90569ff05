//! Aetheria - Development Tools

use std::path::{Path, PathBuf};

use aetheria_core::data::{SectorZone, ZoneId};
use aetheria_tools::{report, validate};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aetheria-tools")]
#[command(about = "Development tools for Aetheria")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },
    /// Generate a zone and print it as JSON
    Generate {
        /// Generation seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Zone radius
        #[arg(long, default_value_t = 5000.0)]
        radius: f32,
        /// Path to data directory
        #[arg(long, default_value = "assets/data")]
        data: PathBuf,
    },
    /// Run a headless simulation and print a JSON summary
    Simulate {
        /// Seed for the zone and the loadouts
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Ticks to run
        #[arg(long, default_value_t = 600)]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value_t = 0.1)]
        delta: f32,
        /// Ships per side in the opening skirmish
        #[arg(long, default_value_t = 0)]
        ships: usize,
        /// Path to data directory
        #[arg(long, default_value = "assets/data")]
        data: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            validate::validate_data_directory(&path)
                .map(|()| tracing::info!("Validation passed"))
                .map_err(|e| e.to_string())
        }
        Commands::Generate { seed, radius, data } => generate(&data, seed, radius),
        Commands::Simulate {
            seed,
            ticks,
            delta,
            ships,
            data,
        } => simulate(&data, seed, ticks, delta, ships),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn sector(radius: f32) -> SectorZone {
    SectorZone::new(ZoneId::new(0), "Generated", (0.0, 0.0), radius)
}

fn generate(data: &Path, seed: u64, radius: f32) -> Result<(), String> {
    let ctx = validate::load_context(data).map_err(|e| e.to_string())?;
    let zone = report::generate(&ctx, seed, sector(radius)).map_err(|e| e.to_string())?;
    print_json(&report::zone_report(&zone, seed, &[]))
}

fn simulate(data: &Path, seed: u64, ticks: u64, delta: f32, ships: usize) -> Result<(), String> {
    let ctx = validate::load_context(data).map_err(|e| e.to_string())?;
    let mut zone = report::generate(&ctx, seed, sector(5000.0)).map_err(|e| e.to_string())?;
    if ships > 0 {
        report::add_skirmish(&mut zone, &ctx, seed, ships).map_err(|e| e.to_string())?;
    }
    print_json(&report::simulate(&mut zone, &ctx, ticks, delta))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
