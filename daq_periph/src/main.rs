//! # DAQ Peripheral Simulator Binary
//!
//! Runs a scripted acquisition loop over the ESP32 and HX711 simulators and
//! reports the final state.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (or /etc/daq/sim.toml when present)
//! daq_periph --steps 500
//!
//! # Explicit config, deterministic noise, JSON output
//! daq_periph --config sim.toml --seed 42 --json
//!
//! # Show the effective configuration
//! daq_periph --config sim.toml --print-config
//! ```

#![deny(warnings)]

use clap::Parser;
use daq_common::config::{ConfigError, ConfigLoader, LogLevel};
use daq_common::periph::config::SimConfig;
use daq_common::periph::consts::DEFAULT_CONFIG_PATH;
use daq_periph::scenario::run_scenario;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// DAQ peripheral simulator - ESP32 SoC and HX711 load-cell amplifier
#[derive(Parser, Debug)]
#[command(name = "daq_periph")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "ESP32 SoC and HX711 load-cell amplifier peripheral simulators")]
#[command(long_about = None)]
struct Args {
    /// Path to simulator configuration file (sim.toml).
    /// Falls back to /etc/daq/sim.toml, then to built-in defaults.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed both noise generators (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of loop iterations
    #[arg(long, default_value_t = 100)]
    steps: u32,

    /// Virtual time per iteration in microseconds
    #[arg(long, default_value_t = 10_000)]
    step_us: u64,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs and the final report in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Simulator run failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = load_config(&args);
    let level = match (&loaded, args.verbose) {
        (_, true) => LogLevel::Debug,
        (Ok(config), false) => config.shared.log_level,
        (Err(_), false) => LogLevel::Info,
    };
    setup_tracing(&args, level);

    let mut config = loaded?;
    if let Some(seed) = args.seed {
        config.esp32.noise_seed = Some(seed);
        config.hx711.noise_seed = Some(seed.wrapping_add(1));
    }
    config.validate()?;

    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    let report = run_scenario(&config, args.steps, args.step_us)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!(
            "{} samples over {} us, strain {:.2}..{:.2} ue, battery {:.2} %",
            report.samples,
            report.esp32.uptime_us,
            report.min_strain,
            report.max_strain,
            report.esp32.battery_level
        );
    }

    info!("{} shutdown complete", config.shared.service_name);
    Ok(())
}

/// Load the configuration named on the command line, or the default file
/// when it exists, or the built-in defaults.
fn load_config(args: &Args) -> Result<SimConfig, ConfigError> {
    match &args.config {
        Some(path) => SimConfig::load(path),
        None => match SimConfig::load(Path::new(DEFAULT_CONFIG_PATH)) {
            Err(ConfigError::FileNotFound) => Ok(SimConfig::default()),
            other => other,
        },
    }
}

/// Setup tracing subscriber based on CLI arguments.
///
/// Logs go to stderr; stdout carries only the report and `--print-config` output.
fn setup_tracing(args: &Args, level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
