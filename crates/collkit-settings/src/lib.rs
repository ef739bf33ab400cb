//! collkit Settings Crate
//!
//! Handles run configuration: collimator definitions, beam generation and
//! the interaction record, loaded from and saved to JSON or TOML files.

pub mod config;

pub use config::{
    BeamSettings, CollimatorSettings, Config, JawPair, PhysicsModel, RecordSettings, SampleRange,
};
