use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use collkit::{generate_beam, init_logging, Config, LogFormat, Simulation, BUILD_DATE, VERSION};

#[derive(Parser, Debug)]
#[command(name = "collkit", about = "Collimator jaw hit detection", version)]
struct Cli {
    /// Log as JSON instead of human-readable text
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a configuration and print the collimator geometries
    Check(ConfigArgs),
    /// Track a generated beam through the configured collimators
    Track(TrackArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Configuration file (.toml or .json); defaults to the user config directory
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TrackArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Override the number of particles
    #[arg(long, short = 'n')]
    particles: Option<usize>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the interaction record to this JSON file
    #[arg(long)]
    records: Option<PathBuf>,
}

fn load_config(args: &ConfigArgs) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path().context("no --config given")?,
    };
    Config::load_from_file(&path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn check(args: ConfigArgs) -> Result<()> {
    let config = load_config(&args)?;
    let simulation = Simulation::from_config(&config).context("invalid collimator")?;
    for (name, geometry) in simulation.geometries() {
        println!("{}: {:#?}", name, geometry);
    }
    tracing::info!("{} collimators OK", simulation.len());
    Ok(())
}

fn track(args: TrackArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(particles) = args.particles {
        config.beam.particles = particles;
    }
    if let Some(seed) = args.seed {
        config.beam.seed = seed;
    }

    let simulation = Simulation::from_config(&config).context("invalid collimator")?;
    let mut particles = generate_beam(&config.beam);
    tracing::info!(
        "Tracking {} particles through {} collimators (seed {})",
        particles.len(),
        simulation.len(),
        config.beam.seed
    );

    let report = simulation.run(&mut particles);

    if let Some(path) = &args.records {
        let written = simulation
            .write_records(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Wrote {} interactions to {}", written, path.display());
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logging(format)?;
    tracing::debug!("collkit {} (built {})", VERSION, BUILD_DATE);

    match cli.command {
        Commands::Check(args) => check(args),
        Commands::Track(args) => track(args),
    }
}
