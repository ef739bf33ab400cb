//! # collkit Core
//!
//! Core types, traits, and utilities for collkit.
//! Provides the particle accessor contract, the field-free frame primitives
//! (drift, rotations, shifts) used to move a particle between the lab frame
//! and a jaw frame, the interaction record, and the error types shared by the
//! other crates.

pub mod constants;
pub mod error;
pub mod particle;
pub mod record;
pub mod transforms;

pub use error::{ConfigError, Error, GeometryError, Result};

pub use particle::{LocalParticle, Particle};

pub use record::{
    InteractionRecord, InteractionSink, InteractionTable, InteractionType, ParticleSnapshot,
    RecordIndex,
};

pub use transforms::{drift, s_rotation, xy_shift, y_rotation_rotate_only};
