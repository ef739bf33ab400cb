//! Configuration for collkit runs
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats; the default location is in the platform config
//! directory.
//!
//! Configuration is organized into logical sections:
//! - Collimators (jaw openings, skew, tilt, jaw physics)
//! - Beam generation (particle count, seed, sampling ranges)
//! - Interaction record (capacity)

use collkit_core::constants::DEFAULT_RECORD_CAPACITY;
use collkit_core::{ConfigError, Error, Result};
use collkit_geometry::{CollimatorGeometry, JawSide, SkewAngles};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

/// Jaw physics applied when a particle reaches a jaw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsModel {
    /// Jaws have no effect
    Transparent,
    /// Every particle reaching a jaw is absorbed
    BlackAbsorber,
}

impl Default for PhysicsModel {
    fn default() -> Self {
        Self::BlackAbsorber
    }
}

impl std::fmt::Display for PhysicsModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transparent => write!(f, "transparent"),
            Self::BlackAbsorber => write!(f, "black absorber"),
        }
    }
}

/// A value per jaw
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JawPair {
    /// Left jaw
    pub left: f64,
    /// Right jaw
    pub right: f64,
}

impl JawPair {
    /// Create a pair
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }
}

/// One collimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollimatorSettings {
    /// Name used in logs and reports
    pub name: String,
    /// Active length in m
    pub length: f64,
    /// Skew angle of both jaws in degrees
    #[serde(default)]
    pub angle: f64,
    /// Skew of the left jaw in degrees, overrides `angle`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_left: Option<f64>,
    /// Skew of the right jaw in degrees, overrides `angle`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_right: Option<f64>,
    /// Jaws present
    #[serde(default)]
    pub side: JawSide,
    /// Log jaw touches into the interaction record
    #[serde(default)]
    pub record_touches: bool,
    /// Jaw physics
    #[serde(default)]
    pub physics: PhysicsModel,
    /// Jaw centre positions in m
    pub jaw: JawPair,
    /// Jaw tilts in radians
    #[serde(default)]
    pub tilt: JawPair,
}

impl Default for CollimatorSettings {
    fn default() -> Self {
        Self {
            name: "tcp".to_string(),
            length: 1.0,
            jaw: JawPair::new(1.0e-3, -1.0e-3),
            angle: 0.0,
            angle_left: None,
            angle_right: None,
            tilt: JawPair::default(),
            side: JawSide::Both,
            record_touches: false,
            physics: PhysicsModel::default(),
        }
    }
}

impl CollimatorSettings {
    /// Skew angles in radians
    pub fn skew(&self) -> SkewAngles {
        SkewAngles {
            left: self.angle_left.unwrap_or(self.angle).to_radians(),
            right: self.angle_right.unwrap_or(self.angle).to_radians(),
        }
    }

    /// Validate this collimator
    pub fn validate(&self) -> Result<()> {
        if !(self.length.is_finite() && self.length > 0.0) {
            return Err(invalid(&self.name, "length", "must be > 0"));
        }

        for (field, value) in [
            ("jaw.left", self.jaw.left),
            ("jaw.right", self.jaw.right),
            ("angle", self.angle),
            ("tilt.left", self.tilt.left),
            ("tilt.right", self.tilt.right),
        ] {
            if !value.is_finite() {
                return Err(invalid(&self.name, field, "must be finite"));
            }
        }

        if self.side == JawSide::Both && self.jaw.left < self.jaw.right {
            return Err(invalid(
                &self.name,
                "jaw",
                "left jaw must not be below the right jaw",
            ));
        }

        if self.tilt.left.abs() >= FRAC_PI_2 || self.tilt.right.abs() >= FRAC_PI_2 {
            return Err(invalid(&self.name, "tilt", "must be within (-pi/2, pi/2)"));
        }

        Ok(())
    }

    /// Build the geometry of this collimator
    pub fn to_geometry(&self) -> Result<CollimatorGeometry> {
        self.validate()?;
        let geometry = CollimatorGeometry::from_jaws(
            self.length,
            self.side,
            self.jaw.left,
            self.jaw.right,
            self.skew(),
            self.tilt.left,
            self.tilt.right,
        )?;
        Ok(geometry)
    }
}

/// Uniform sampling interval
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl SampleRange {
    /// Create a range
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether the range has zero width
    pub fn is_point(&self) -> bool {
        self.min == self.max
    }

    fn check(&self, field: &str) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(Error::from(ConfigError::InvalidValue {
                field: format!("beam.{}", field),
                reason: format!("invalid range [{}, {}]", self.min, self.max),
            }));
        }
        Ok(())
    }
}

/// Beam generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamSettings {
    /// Number of particles
    pub particles: usize,
    /// Random seed
    pub seed: u64,
    /// Relative momentum deviation
    #[serde(default)]
    pub delta: f64,
    /// Horizontal position in m
    pub x: SampleRange,
    /// Horizontal momentum
    pub px: SampleRange,
    /// Vertical position in m
    #[serde(default)]
    pub y: SampleRange,
    /// Vertical momentum
    #[serde(default)]
    pub py: SampleRange,
}

impl Default for BeamSettings {
    fn default() -> Self {
        Self {
            particles: 10_000,
            seed: 42,
            x: SampleRange::new(-1.5e-3, 1.5e-3),
            px: SampleRange::new(-2.0e-5, 2.0e-5),
            y: SampleRange::default(),
            py: SampleRange::default(),
            delta: 0.0,
        }
    }
}

/// Interaction record settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSettings {
    /// Maximum number of stored interactions
    pub capacity: usize,
}

impl Default for RecordSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_RECORD_CAPACITY,
        }
    }
}

/// Complete run configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Beam generation
    #[serde(default)]
    pub beam: BeamSettings,
    /// Interaction record
    #[serde(default)]
    pub record: RecordSettings,
    /// Collimators in tracking order
    pub collimators: Vec<CollimatorSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            beam: BeamSettings::default(),
            record: RecordSettings::default(),
            collimators: vec![CollimatorSettings::default()],
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("collkit").join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                reason: format!("invalid JSON config: {}", e),
            })?,
            Format::Toml => toml::from_str(&content).map_err(|e| ConfigError::Parse {
                reason: format!("invalid TOML config: {}", e),
            })?,
        };

        config.validate()?;
        tracing::debug!(
            "Loaded config from {} ({} collimators)",
            path.display(),
            config.collimators.len()
        );
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => {
                serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
                    reason: e.to_string(),
                })?
            }
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
                reason: e.to_string(),
            })?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.collimators.is_empty() {
            return Err(Error::from(ConfigError::InvalidValue {
                field: "collimators".to_string(),
                reason: "at least one collimator is required".to_string(),
            }));
        }
        for collimator in &self.collimators {
            collimator.validate()?;
        }

        if self.beam.particles == 0 {
            return Err(Error::from(ConfigError::InvalidValue {
                field: "beam.particles".to_string(),
                reason: "must be > 0".to_string(),
            }));
        }
        self.beam.x.check("x")?;
        self.beam.px.check("px")?;
        self.beam.y.check("y")?;
        self.beam.py.check("py")?;
        if !(self.beam.delta.is_finite() && self.beam.delta > -1.0) {
            return Err(Error::from(ConfigError::InvalidValue {
                field: "beam.delta".to_string(),
                reason: "must be finite and > -1".to_string(),
            }));
        }

        if self.record.capacity == 0 {
            return Err(Error::from(ConfigError::InvalidValue {
                field: "record.capacity".to_string(),
                reason: "must be > 0".to_string(),
            }));
        }

        Ok(())
    }

    /// Whether any collimator logs jaw touches
    pub fn records_touches(&self) -> bool {
        self.collimators.iter().any(|c| c.record_touches)
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(Error::from(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            })),
        }
    }
}

fn invalid(name: &str, field: &str, reason: &str) -> Error {
    Error::from(ConfigError::InvalidValue {
        field: format!("collimators.{}.{}", name, field),
        reason: reason.to_string(),
    })
}
