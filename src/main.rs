use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hamlet::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    systems::UpdateMode,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Emoji town simulation runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario headless for a fixed number of ticks
    Run {
        /// Path to the scenario YAML file
        #[arg(long, default_value = "scenarios/fantasy_town.yaml")]
        scenario: PathBuf,

        /// Override tick count (uses scenario default when omitted)
        #[arg(long)]
        ticks: Option<u64>,

        /// Override the scenario's update mode
        #[arg(long, value_enum)]
        mode: Option<UpdateMode>,

        /// Override snapshot interval in ticks
        #[arg(long)]
        snapshot_interval: Option<u64>,

        /// Directory for snapshots
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
    /// Serve the town over HTTP with start/stop/step controls
    Serve {
        /// Path to the scenario YAML file
        #[arg(long, default_value = "scenarios/fantasy_town.yaml")]
        scenario: PathBuf,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 3001)]
        port: u16,

        /// Milliseconds between automatic ticks
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Override snapshot interval in ticks
        #[arg(long)]
        snapshot_interval: Option<u64>,

        /// Directory for snapshots
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Run {
            scenario,
            ticks,
            mode,
            snapshot_interval,
            snapshot_dir,
        } => run_headless(scenario, ticks, mode, snapshot_interval, snapshot_dir),
        Command::Serve {
            scenario,
            host,
            port,
            tick_ms,
            snapshot_interval,
            snapshot_dir,
        } => serve(scenario, host, port, tick_ms, snapshot_interval, snapshot_dir),
    }
}

fn run_headless(
    scenario_path: PathBuf,
    ticks: Option<u64>,
    mode: Option<UpdateMode>,
    snapshot_interval: Option<u64>,
    snapshot_dir: Option<PathBuf>,
) -> Result<()> {
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&scenario_path)?;
    let mut world = scenario.build_world();
    let ticks = scenario.ticks(ticks);
    let mode = mode.unwrap_or(scenario.mode);
    let snapshot_interval = snapshot_interval.unwrap_or(scenario.snapshot_interval_ticks);
    let snapshot_dir = snapshot_dir.unwrap_or_else(|| PathBuf::from("snapshots"));

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    };
    let mut engine = EngineBuilder::new(settings).with_mode(mode).build();

    world.running = true;
    engine.run(&mut world, ticks)?;
    println!(
        "Scenario '{}' completed for {} ticks. Town clock: {}. Messages logged: {}",
        scenario.name,
        ticks,
        world.clock.stamp(),
        world.messages().count()
    );
    Ok(())
}

fn serve(
    scenario_path: PathBuf,
    host: String,
    port: u16,
    tick_ms: Option<u64>,
    snapshot_interval: Option<u64>,
    snapshot_dir: Option<PathBuf>,
) -> Result<()> {
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&scenario_path)?;
    let config = WebServerConfig {
        tick_interval_ms: tick_ms.unwrap_or(scenario.tick_interval_ms),
        snapshot_interval: snapshot_interval.unwrap_or(scenario.snapshot_interval_ticks),
        snapshot_dir: snapshot_dir.unwrap_or_else(|| PathBuf::from("snapshots")),
        host,
        port,
        scenario,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::run(config))
}
