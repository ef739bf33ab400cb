//! Multi-collimator runs
//!
//! Builds the collimators of a [`Config`] once, generates a seeded beam and
//! tracks it through every collimator in order. Each collimator sees the
//! particles as the previous one left them; lost particles are skipped.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use collkit_core::{InteractionTable, Particle, Result};
use collkit_geometry::{
    track_batch, BlackAbsorber, CollimatorGeometry, TrackingSummary, Transparent,
};
use collkit_settings::{BeamSettings, Config, PhysicsModel, SampleRange};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Generate the particles described by `settings`.
///
/// The same seed always produces the same beam.
pub fn generate_beam(settings: &BeamSettings) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    (0..settings.particles)
        .map(|id| {
            let x = sample(&mut rng, &settings.x);
            let px = sample(&mut rng, &settings.px);
            let y = sample(&mut rng, &settings.y);
            let py = sample(&mut rng, &settings.py);
            Particle::new(id as i64)
                .with_x(x, px)
                .with_y(y, py)
                .with_delta(settings.delta)
        })
        .collect()
}

fn sample(rng: &mut StdRng, range: &SampleRange) -> f64 {
    if range.is_point() {
        range.min
    } else {
        rng.gen_range(range.min..range.max)
    }
}

/// One collimator of a run
#[derive(Debug)]
struct Stage {
    name: String,
    geometry: CollimatorGeometry,
    physics: PhysicsModel,
}

/// Outcome of one collimator
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    /// Collimator name
    pub name: String,
    /// What happened there
    pub summary: TrackingSummary,
}

/// Outcome of a run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Number of particles tracked
    pub particles: usize,
    /// Particles still alive after the last collimator
    pub surviving: usize,
    /// Per collimator, in tracking order
    pub stages: Vec<StageReport>,
    /// Sum over all collimators
    pub total: TrackingSummary,
    /// Interactions stored in the record
    pub recorded: usize,
    /// Interactions that did not fit in the record
    pub dropped: usize,
}

/// Prepared collimator sequence
#[derive(Debug)]
pub struct Simulation {
    stages: Vec<Stage>,
    record: Option<Arc<InteractionTable>>,
}

impl Simulation {
    /// Build every collimator of `config`.
    ///
    /// An interaction table is allocated only if some collimator records touches.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let record = config
            .records_touches()
            .then(|| Arc::new(InteractionTable::new(config.record.capacity)));

        let mut stages = Vec::with_capacity(config.collimators.len());
        for settings in &config.collimators {
            let mut geometry = settings.to_geometry()?;
            if let Some(table) = record.as_ref().filter(|_| settings.record_touches) {
                geometry = geometry.with_record(table.clone());
            }
            tracing::debug!(collimator = %settings.name, ?geometry, "collimator ready");
            stages.push(Stage {
                name: settings.name.clone(),
                geometry,
                physics: settings.physics,
            });
        }

        Ok(Self { stages, record })
    }

    /// Number of collimators
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether there are no collimators
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Geometry of every collimator, with its name
    pub fn geometries(&self) -> impl Iterator<Item = (&str, &CollimatorGeometry)> {
        self.stages.iter().map(|s| (s.name.as_str(), &s.geometry))
    }

    /// Interaction table, if any collimator records touches
    pub fn record(&self) -> Option<&InteractionTable> {
        self.record.as_deref()
    }

    /// Track `particles` through every collimator in order
    pub fn run(&self, particles: &mut [Particle]) -> SimulationReport {
        let mut stages = Vec::with_capacity(self.stages.len());
        let mut total = TrackingSummary::default();
        for stage in &self.stages {
            let summary = match stage.physics {
                PhysicsModel::Transparent => {
                    track_batch(particles, &stage.geometry, &mut Transparent)
                }
                PhysicsModel::BlackAbsorber => {
                    track_batch(particles, &stage.geometry, &mut BlackAbsorber)
                }
            };
            tracing::info!(
                "{}: {} tracked, {} left jaw, {} right jaw, {} lost",
                stage.name,
                summary.tracked,
                summary.hit_left,
                summary.hit_right,
                summary.lost
            );
            total.merge(&summary);
            stages.push(StageReport {
                name: stage.name.clone(),
                summary,
            });
        }

        let surviving = particles.iter().filter(|p| p.state > 0).count();
        let (recorded, dropped) = self
            .record
            .as_ref()
            .map_or((0, 0), |table| (table.len(), table.dropped()));

        SimulationReport {
            particles: particles.len(),
            surviving,
            stages,
            total,
            recorded,
            dropped,
        }
    }

    /// Write the interaction record as JSON. Returns the number of records written.
    pub fn write_records(&self, path: &Path) -> Result<usize> {
        let Some(table) = &self.record else {
            tracing::warn!("No collimator records touches; {} not written", path.display());
            return Ok(0);
        };
        let writer = BufWriter::new(File::create(path)?);
        table.write_json(writer)?;
        Ok(table.len())
    }
}
