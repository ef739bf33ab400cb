//! # collkit Geometry
//!
//! Jaw geometry of a collimator and the hit detector that brackets jaw
//! physics during tracking.
//!
//! ## Core Components
//!
//! - **Geometry**: [`CollimatorGeometry`], precomputed jaw corners, skew
//!   rotations and tilt trigonometry
//! - **Polygon**: first crossing of a straight trajectory with an open jaw face
//! - **Hit detection**: [`hit_jaws_check_and_transform`] and
//!   [`hit_jaws_transform_back`]
//! - **Tracking**: [`track_collimator`] and [`track_batch`] drive the two
//!   calls around a [`JawPhysics`] model
//!
//! ## Architecture
//!
//! ```text
//! Lab frame
//!   └── Skew frame (rotation about the beam axis)
//!         └── Jaw frame (drift to impact, shift, tilt, mirror for the right jaw)
//!               └── JawPhysics
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use collkit_core::Particle;
//! use collkit_geometry::{
//!     track_collimator, BlackAbsorber, CollimatorGeometry, HitOutcome, JawCorners, JawSide,
//!     SkewAngles,
//! };
//!
//! let geometry = CollimatorGeometry::new(
//!     1.0,
//!     JawSide::Both,
//!     JawCorners::new(1.0e-3, 1.0e-3),
//!     JawCorners::new(-1.0e-3, -1.0e-3),
//!     SkewAngles::default(),
//! )?;
//!
//! let mut particle = Particle::new(0).with_x(0.0, 2.0e-3);
//! let outcome = track_collimator(&mut particle, &geometry, &mut BlackAbsorber);
//! assert_eq!(outcome, Some(HitOutcome::HitLeft));
//! # Ok::<(), collkit_core::GeometryError>(())
//! ```

pub mod frame;
pub mod geometry;
pub mod hit;
pub mod polygon;
pub mod tracking;

pub use frame::{Frame, HitOutcome};
pub use geometry::{CollimatorGeometry, Jaw, JawCorners, JawSide, Rotation, SkewAngles, Tilt};
pub use hit::{hit_jaws_check_and_transform, hit_jaws_transform_back, right_jaw_first};
pub use polygon::{crossing_from_distance, first_crossing, first_crossing_distance, OpenPolygon};
pub use tracking::{
    track_batch, track_collimator, BlackAbsorber, JawPhysics, TrackingSummary, Transparent,
};
