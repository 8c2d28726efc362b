use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use poultry_farm::{
    config::ConfigLoader,
    engine::{GameLoopBuilder, ScriptStep},
    species::Species,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Poultry farm simulation")]
struct Cli {
    /// Path to the farm YAML file
    #[arg(long, global = true, default_value = "scenarios/starter_farm.yaml")]
    config: PathBuf,

    /// Override the random seed from the farm file
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate without a display and print the final farm
    Run {
        /// Simulated seconds to run
        #[arg(long, default_value_t = 600.0)]
        seconds: f64,

        /// Frames per simulated second
        #[arg(long, default_value_t = 60)]
        fps: u32,

        /// YAML list of timed player actions
        #[arg(long)]
        script: Option<PathBuf>,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the browser HUD
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,

        #[arg(long, default_value_t = 30)]
        fps: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let loader = ConfigLoader::new(".");
    let mut config = loader.load(&cli.config)?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    match cli.command {
        Command::Run {
            seconds,
            fps,
            script,
            json,
        } => {
            let steps: Vec<ScriptStep> = match script {
                Some(path) => {
                    let data = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read script {}", path.display()))?;
                    serde_yaml::from_str(&data)
                        .with_context(|| format!("Failed to parse script {}", path.display()))?
                }
                None => Vec::new(),
            };

            let name = config.name.clone();
            let mut game = GameLoopBuilder::new(config).build();
            let records = game.run_scripted(seconds, fps, &steps);
            for record in &records {
                tracing::info!(
                    at = record.at_secs,
                    action = record.action.name(),
                    applied = record.outcome.is_applied(),
                    "scripted action"
                );
            }

            let snapshot = game.farm().snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                let counters = &snapshot.counters;
                println!(
                    "Farm '{}' ran {:.0}s over {} frames. Birds: {}, money: {}, food: {}",
                    name,
                    seconds,
                    game.frames(),
                    counters.poultry_count,
                    counters.money,
                    counters.food
                );
                for species in Species::ALL {
                    println!(
                        "  {species} eggs: {}",
                        counters.eggs.get(&species).copied().unwrap_or(0)
                    );
                }
            }
        }
        Command::Serve { host, port, fps } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(web::run(WebServerConfig {
                farm: config,
                fps,
                host,
                port,
            }))?;
        }
    }
    Ok(())
}
