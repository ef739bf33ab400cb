//! Tracking a particle through one collimator
//!
//! Wraps the check/physics/transform-back protocol so that host code only
//! supplies the jaw physics. Particle `s` is handled here: the kernel works
//! with `s` measured from the element entrance, the caller keeps its own
//! longitudinal position.

use collkit_core::constants::LOST_ON_COLLIMATOR;
use collkit_core::{InteractionType, LocalParticle};
use serde::{Deserialize, Serialize};

use crate::frame::HitOutcome;
use crate::geometry::{CollimatorGeometry, Jaw};
use crate::hit::{hit_jaws_check_and_transform, hit_jaws_transform_back};

/// Physics evaluated inside a jaw
///
/// Called with the particle in the jaw frame: `x = 0` on the face, material
/// at `x > 0`, `s` measured along the face from its upstream end. A model that
/// stops the particle sets its state to a non-positive value.
pub trait JawPhysics<P: LocalParticle + ?Sized> {
    /// Evaluate the interaction of `particle` with `jaw`.
    fn interact(&mut self, particle: &mut P, jaw: Jaw, geometry: &CollimatorGeometry);
}

impl<P, F> JawPhysics<P> for F
where
    P: LocalParticle + ?Sized,
    F: FnMut(&mut P, Jaw),
{
    fn interact(&mut self, particle: &mut P, jaw: Jaw, _geometry: &CollimatorGeometry) {
        self(particle, jaw)
    }
}

/// Jaws that do nothing to the particle
#[derive(Debug, Clone, Copy, Default)]
pub struct Transparent;

impl<P: LocalParticle + ?Sized> JawPhysics<P> for Transparent {
    fn interact(&mut self, _particle: &mut P, _jaw: Jaw, _geometry: &CollimatorGeometry) {}
}

/// Jaws that absorb every particle reaching them
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackAbsorber;

impl<P: LocalParticle + ?Sized> JawPhysics<P> for BlackAbsorber {
    fn interact(&mut self, particle: &mut P, _jaw: Jaw, geometry: &CollimatorGeometry) {
        particle.set_state(LOST_ON_COLLIMATOR);
        geometry.log_interaction(particle, InteractionType::Absorbed);
    }
}

/// Counts of what happened to a batch of particles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSummary {
    /// Particles that entered the collimator alive
    pub tracked: usize,
    /// Particles already lost before the collimator
    pub skipped: usize,
    /// Particles that passed without touching a jaw
    pub no_hit: usize,
    /// Particles that reached the left jaw
    pub hit_left: usize,
    /// Particles that reached the right jaw
    pub hit_right: usize,
    /// Particles lost inside the collimator
    pub lost: usize,
}

impl TrackingSummary {
    /// Account for one particle
    pub fn record(&mut self, outcome: Option<HitOutcome>, alive_after: bool) {
        let Some(outcome) = outcome else {
            self.skipped += 1;
            return;
        };
        self.tracked += 1;
        match outcome {
            HitOutcome::NoHit => self.no_hit += 1,
            HitOutcome::HitLeft => self.hit_left += 1,
            HitOutcome::HitRight => self.hit_right += 1,
        }
        if !alive_after {
            self.lost += 1;
        }
    }

    /// Add another summary into this one
    pub fn merge(&mut self, other: &TrackingSummary) {
        self.tracked += other.tracked;
        self.skipped += other.skipped;
        self.no_hit += other.no_hit;
        self.hit_left += other.hit_left;
        self.hit_right += other.hit_right;
        self.lost += other.lost;
    }

    /// Particles that reached either jaw
    pub fn hits(&self) -> usize {
        self.hit_left + self.hit_right
    }
}

/// Track one particle through the collimator.
///
/// Returns `None` without touching a particle that is already lost.
/// Otherwise the particle leaves in the lab frame with
/// `s = s_entry + length` if it survived, or at its loss position.
pub fn track_collimator<P, J>(
    particle: &mut P,
    geometry: &CollimatorGeometry,
    physics: &mut J,
) -> Option<HitOutcome>
where
    P: LocalParticle + ?Sized,
    J: JawPhysics<P> + ?Sized,
{
    if !particle.is_alive() {
        return None;
    }

    let s_entry = particle.s();
    particle.set_s(0.0);

    let outcome = hit_jaws_check_and_transform(particle, geometry);
    if let Some(jaw) = outcome.jaw() {
        physics.interact(particle, jaw, geometry);
    }
    hit_jaws_transform_back(outcome, particle, geometry);

    let s_local = particle.s();
    particle.set_s(s_entry + s_local);
    Some(outcome)
}

/// Track a batch of particles through the collimator.
pub fn track_batch<P, J>(
    particles: &mut [P],
    geometry: &CollimatorGeometry,
    physics: &mut J,
) -> TrackingSummary
where
    P: LocalParticle,
    J: JawPhysics<P> + ?Sized,
{
    let mut summary = TrackingSummary::default();
    for particle in particles.iter_mut() {
        let outcome = track_collimator(particle, geometry, physics);
        summary.record(outcome, particle.is_alive());
    }
    tracing::debug!(
        tracked = summary.tracked,
        skipped = summary.skipped,
        hit_left = summary.hit_left,
        hit_right = summary.hit_right,
        lost = summary.lost,
        "collimator batch done"
    );
    summary
}
