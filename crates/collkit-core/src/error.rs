//! Error handling for collkit
//!
//! Provides error types for the layers that can fail:
//! - Geometry errors (building a collimator geometry from parameters)
//! - Configuration errors (loading/validating settings files)
//!
//! The hit-detection kernel itself never fails; all failures happen while
//! a geometry is being constructed. All error types use `thiserror`.

use thiserror::Error;

/// Geometry error type
///
/// Raised while constructing or validating a collimator geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Element length is zero, negative or not finite
    #[error("Collimator length must be positive and finite, got {length}")]
    InvalidLength {
        /// The rejected length.
        length: f64,
    },

    /// A parameter is NaN or infinite
    #[error("Geometry parameter '{field}' is not finite: {value}")]
    NonFinite {
        /// The parameter name.
        field: String,
        /// The rejected value.
        value: f64,
    },

    /// The tilt of a jaw makes its face perpendicular to the beam
    #[error("Tilt of the {jaw} jaw is degenerate (cos = {cos})")]
    DegenerateTilt {
        /// Which jaw ("left" or "right").
        jaw: String,
        /// The cosine of the tilt angle.
        cos: f64,
    },

    /// Precomputed trigonometric values are inconsistent
    #[error("Inconsistent trigonometry for '{field}': {reason}")]
    InconsistentTrig {
        /// The offending field group.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The parallel fast path was requested for jaws with different skew
    #[error("Jaws flagged parallel but skew angles differ (left sin={sin_left}, right sin={sin_right})")]
    NotParallel {
        /// Sine of the left skew angle.
        sin_left: f64,
        /// Sine of the right skew angle.
        sin_right: f64,
    },
}

/// Configuration error type
///
/// Represents errors while loading, parsing or validating settings.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Invalid value for a setting
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// The setting name.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// Unknown side specifier
    #[error("Unknown jaw side: {value}")]
    UnknownSide {
        /// The unparsed value.
        value: String,
    },

    /// File format not supported
    #[error("Config file must be .json or .toml: {path}")]
    UnsupportedFormat {
        /// The offending path.
        path: String,
    },

    /// Parsing failed
    #[error("Failed to parse config: {reason}")]
    Parse {
        /// Parser message.
        reason: String,
    },

    /// Serialization failed
    #[error("Failed to serialize config: {reason}")]
    Serialize {
        /// Serializer message.
        reason: String,
    },

    /// No configuration directory could be determined
    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

/// Main error type for collkit
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
