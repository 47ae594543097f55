#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays Hyperdrone enemy encounters headlessly.

mod scenario;
mod simulation;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    scenario::Scenario,
    simulation::{run, Overrides},
};

/// Runs a scripted encounter and prints a per-agent summary.
#[derive(Debug, Parser)]
#[command(name = "hyperdrone-sim", version)]
struct Args {
    /// Scenario file describing the maze, the player and the enemies.
    #[arg(long, default_value = "demos/arena.toml")]
    scenario: PathBuf,
    /// Number of ticks to simulate instead of the scenario's own count.
    #[arg(long)]
    ticks: Option<u32>,
    /// Seed for the shared random stream instead of the scenario's own seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Drop in-flight paths as soon as a maze mutation crosses them.
    #[arg(long)]
    eager_invalidation: bool,
}

/// Entry point for the Hyperdrone simulation command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let scenario = Scenario::load(&args.scenario)?;
    let report = run(
        &scenario,
        Overrides {
            ticks: args.ticks,
            seed: args.seed,
            eager_invalidation: args.eager_invalidation,
        },
    )?;
    print!("{report}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hyperdrone=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
