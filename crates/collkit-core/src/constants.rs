//! Shared numeric constants

/// Particle state of a live particle.
pub const ALIVE: i64 = 1;

/// Particle state assigned when a particle is absorbed in a collimator jaw.
pub const LOST_ON_COLLIMATOR: i64 = -333;

/// Distance used to fill "no crossing" in sentinel form.
pub const NO_CROSSING: f64 = 1.0e21;

/// Any crossing distance at or above this value is treated as "no crossing".
pub const CROSSING_THRESHOLD: f64 = 1.0e20;

/// Smallest tilt cosine accepted when building a jaw geometry.
pub const MIN_TILT_COSINE: f64 = 1.0e-12;

/// Tolerance on `sin² + cos² = 1` for precomputed trigonometry.
pub const TRIG_TOLERANCE: f64 = 1.0e-9;

/// Default capacity of an interaction table.
pub const DEFAULT_RECORD_CAPACITY: usize = 100_000;
