//! CLI entry point for the simulation harness: config checks, closed-loop runs, and CSV output.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use trajgen_rs::KinematicChain;
use trajgen_rs::config::{Config, load_config};
use trajgen_rs::simulator::Simulation;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Simulation Harness CLI
#[derive(Parser, Debug)]
#[command(
    name = "sim-harness",
    about = "Closed-loop simulation harness for the joint trajectory generator."
)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, default_value = "configs/two_link_arm.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the kinematic chain and validate limits
    Check,
    /// Run the simulation (default)
    Run {
        /// CSV trace output (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pace ticks at the configured control rate
        #[arg(long)]
        realtime: bool,

        /// Print a JSON summary to stderr when done
        #[arg(long)]
        summary: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config).map_err(|e| {
        tracing::error!("Failed to load config from '{}': {}", cli.config.display(), e);
        Box::new(e) as BoxError
    })?;

    match cli.command.unwrap_or(Commands::Run {
        output: None,
        realtime: false,
        summary: false,
    }) {
        Commands::Check => check(&config),
        Commands::Run {
            output,
            realtime,
            summary,
        } => run(&config, output, realtime, summary).await,
    }
}

fn check(config: &Config) -> Result<(), BoxError> {
    let chain = KinematicChain::resolve(&config.chain)?;
    config.generator.validate(chain.n_dof())?;
    if let Some(sim) = &config.simulation {
        sim.validate(chain.n_dof())?;
    }
    println!("Chain {} -> {}: {} joints", chain.root_link(), chain.tip_link(), chain.n_dof());
    for (i, joint) in chain.joints().iter().enumerate() {
        println!(
            "  [{}] {:<16} {:?}  vmax={} amax={}",
            i,
            joint.name,
            joint.kind,
            config.generator.trap_max_vels[i],
            config.generator.trap_max_accs[i]
        );
    }
    println!("velocity_smoothing_factor = {}", config.generator.velocity_smoothing_factor);
    Ok(())
}

async fn run(
    config: &Config,
    output: Option<PathBuf>,
    realtime: bool,
    summary: bool,
) -> Result<(), BoxError> {
    let mut sim = Simulation::from_config(config)?;

    let sink: Box<dyn Write> = match &output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(sink);

    if realtime {
        let mut interval = tokio::time::interval(sim.clock().period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        while !sim.is_finished() {
            interval.tick().await;
            for record in sim.step() {
                writer.serialize(record)?;
            }
        }
    } else {
        while !sim.is_finished() {
            for record in sim.step() {
                writer.serialize(record)?;
            }
        }
    }
    writer.flush()?;

    if let Some(path) = &output {
        tracing::info!("Wrote trace to {}", path.display());
    }
    let stats = sim.summary();
    tracing::info!(
        "Finished {} ticks ({} emitted, {} replans) in {:?} simulated",
        stats.ticks,
        stats.emitted_ticks,
        stats.replans,
        Duration::from_secs_f64(sim.clock().seconds())
    );
    if summary {
        eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Ok(())
}
