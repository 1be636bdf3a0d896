//! Gridhaul - Entry Point
//!
//! Parses the coordinator's startup parameters, attempts oracle seed
//! recovery, then runs the dispatch loop over a JSON-lines link on
//! stdin/stdout until the coordinator reports finished or an error.

use std::path::PathBuf;

use clap::Parser;

use gridhaul::auth::{unix_now, AuthResolver};
use gridhaul::core::config::DispatchConfig;
use gridhaul::core::error::{DispatchError, Result};
use gridhaul::engine::DispatchEngine;
use gridhaul::ipc::startup::StartupParams;
use gridhaul::ipc::stdio::StdioLink;

#[derive(Parser, Debug)]
#[command(name = "gridhaul", about = "Turn-synchronous fleet dispatch agent")]
struct Args {
    /// Startup-parameter file handed over by the coordinator
    params: PathBuf,

    /// Optional TOML file overriding the default engine tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is not set
    #[arg(long, default_value = "gridhaul=info")]
    log: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log)),
        )
        .with_writer(std::io::stderr)
        .init();

    let params = StartupParams::from_path(&args.params)?;
    tracing::info!(
        grid = params.grid_size,
        vehicles = params.vehicle_count,
        oracles = params.oracle_count,
        final_turn = params.final_turn,
        "starting dispatch agent"
    );

    let config = match &args.config {
        Some(path) => DispatchConfig::from_path(path)?,
        None => DispatchConfig::default(),
    };
    config.validate().map_err(DispatchError::Config)?;

    let resolver = AuthResolver::from_recovery(
        &params.reference_draws(),
        config.seed_window(),
        unix_now(),
    );

    let mut engine = DispatchEngine::new(config, params.vehicle_count, resolver);
    let mut link = StdioLink::over_stdio();
    engine.run(&mut link)
}
