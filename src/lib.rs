//! # collkit
//!
//! Collimator jaw hit detection for particle tracking.
//!
//! ## Architecture
//!
//! collkit is organized as a workspace with multiple crates:
//!
//! 1. **collkit-core** - Particle accessor contract, frame primitives, errors, interaction record
//! 2. **collkit-geometry** - Jaw geometry, polygon crossing, hit detection, tracking driver
//! 3. **collkit-settings** - Run configuration (JSON/TOML)
//! 4. **collkit** - Beam generation, multi-collimator runs and the command-line tool
//!
//! ## Features
//!
//! - **Two-jaw collimators**: independent skew and tilt per jaw, single-jaw variants
//! - **Open-polygon jaw faces**: particles entering behind a jaw face are caught at its flank
//! - **Exact or expanded drifts**: `exact-drifts` feature
//! - **Interaction record**: lock-free slot allocation, JSON export

pub mod simulation;

pub use collkit_core::{
    ConfigError, Error, GeometryError, InteractionTable, InteractionType, LocalParticle, Particle,
    Result,
};
pub use collkit_geometry::{
    hit_jaws_check_and_transform, hit_jaws_transform_back, track_batch, track_collimator,
    BlackAbsorber, CollimatorGeometry, HitOutcome, Jaw, JawPhysics, JawSide, TrackingSummary,
    Transparent,
};
pub use collkit_settings::Config;
pub use simulation::{generate_beam, Simulation, SimulationReport, StageReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, multi-line
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr, so stdout stays free for reports
/// - RUST_LOG environment variable support (default level INFO)
/// - Pretty or JSON formatting
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .pretty();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}
