//! Particle accessor contract and a single-particle implementation
//!
//! The tracking engine owns particle storage. Everything in collkit reaches a
//! particle only through [`LocalParticle`], so a host can plug in its own
//! representation (a row of a struct-of-arrays, a GPU lane view, ...) without
//! copying into [`Particle`].
//!
//! Coordinates follow the usual accelerator conventions: `x`/`y` transverse
//! positions, `px`/`py` momenta normalised to the reference momentum, `s`
//! longitudinal position, `zeta` longitudinal lag and `delta` relative
//! momentum deviation.

use serde::{Deserialize, Serialize};

use crate::constants::{ALIVE, LOST_ON_COLLIMATOR};

/// Accessor/mutator contract required from a particle representation
pub trait LocalParticle {
    /// Horizontal position.
    fn x(&self) -> f64;
    /// Set the horizontal position.
    fn set_x(&mut self, value: f64);
    /// Horizontal momentum.
    fn px(&self) -> f64;
    /// Set the horizontal momentum.
    fn set_px(&mut self, value: f64);
    /// Vertical position.
    fn y(&self) -> f64;
    /// Set the vertical position.
    fn set_y(&mut self, value: f64);
    /// Vertical momentum.
    fn py(&self) -> f64;
    /// Set the vertical momentum.
    fn set_py(&mut self, value: f64);
    /// Longitudinal position.
    fn s(&self) -> f64;
    /// Set the longitudinal position.
    fn set_s(&mut self, value: f64);
    /// Longitudinal lag.
    fn zeta(&self) -> f64;
    /// Set the longitudinal lag.
    fn set_zeta(&mut self, value: f64);
    /// Relative momentum deviation.
    fn delta(&self) -> f64;
    /// Ratio of reference velocity to particle velocity.
    fn rvv(&self) -> f64;
    /// Survival state; positive means alive.
    fn state(&self) -> i64;
    /// Set the survival state.
    fn set_state(&mut self, value: i64);
    /// Identifier of the particle inside its bunch.
    fn particle_id(&self) -> i64;

    /// `1 / (1 + delta)`
    fn rpp(&self) -> f64 {
        1.0 / (1.0 + self.delta())
    }

    /// Add to the longitudinal position.
    fn add_to_s(&mut self, value: f64) {
        let s = self.s();
        self.set_s(s + value);
    }

    /// Scale the horizontal position (`-1.0` mirrors it).
    fn scale_x(&mut self, factor: f64) {
        let x = self.x();
        self.set_x(x * factor);
    }

    /// Scale the horizontal momentum (`-1.0` mirrors it).
    fn scale_px(&mut self, factor: f64) {
        let px = self.px();
        self.set_px(px * factor);
    }

    /// Paraxial horizontal slope `px / (1 + delta)`.
    fn xp(&self) -> f64 {
        self.px() * self.rpp()
    }

    /// Paraxial vertical slope `py / (1 + delta)`.
    fn yp(&self) -> f64 {
        self.py() * self.rpp()
    }

    /// Exact horizontal slope `dx/ds`.
    fn exact_xp(&self) -> f64 {
        self.px() / longitudinal_momentum(self)
    }

    /// Exact vertical slope `dy/ds`.
    fn exact_yp(&self) -> f64 {
        self.py() / longitudinal_momentum(self)
    }

    /// Horizontal slope used for jaw crossing checks.
    ///
    /// Exact with the `exact-drifts` feature, paraxial otherwise.
    fn transverse_slope(&self) -> f64 {
        if cfg!(feature = "exact-drifts") {
            self.exact_xp()
        } else {
            self.xp()
        }
    }

    /// Whether the particle is still being tracked.
    fn is_alive(&self) -> bool {
        self.state() > 0
    }
}

/// `pz = sqrt((1 + delta)^2 - px^2 - py^2)`
pub(crate) fn longitudinal_momentum<P: LocalParticle + ?Sized>(part: &P) -> f64 {
    let one_plus_delta = 1.0 + part.delta();
    (one_plus_delta * one_plus_delta - part.px() * part.px() - part.py() * part.py()).sqrt()
}

/// A single tracked particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Horizontal position (m)
    pub x: f64,
    /// Horizontal normalised momentum
    pub px: f64,
    /// Vertical position (m)
    pub y: f64,
    /// Vertical normalised momentum
    pub py: f64,
    /// Longitudinal position (m)
    pub s: f64,
    /// Longitudinal lag (m)
    pub zeta: f64,
    /// Relative momentum deviation
    pub delta: f64,
    /// Reference-to-particle velocity ratio
    pub rvv: f64,
    /// Survival state
    pub state: i64,
    /// Identifier
    pub particle_id: i64,
}

impl Particle {
    /// Create an on-axis, on-momentum, alive particle
    pub fn new(particle_id: i64) -> Self {
        Self {
            x: 0.0,
            px: 0.0,
            y: 0.0,
            py: 0.0,
            s: 0.0,
            zeta: 0.0,
            delta: 0.0,
            rvv: 1.0,
            state: ALIVE,
            particle_id,
        }
    }

    /// Set the horizontal phase-space coordinates
    pub fn with_x(mut self, x: f64, px: f64) -> Self {
        self.x = x;
        self.px = px;
        self
    }

    /// Set the vertical phase-space coordinates
    pub fn with_y(mut self, y: f64, py: f64) -> Self {
        self.y = y;
        self.py = py;
        self
    }

    /// Set the longitudinal position
    pub fn with_s(mut self, s: f64) -> Self {
        self.s = s;
        self
    }

    /// Set the relative momentum deviation
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Mark the particle as absorbed in a collimator
    pub fn absorb(&mut self) {
        self.state = LOST_ON_COLLIMATOR;
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::new(0)
    }
}

impl LocalParticle for Particle {
    fn x(&self) -> f64 {
        self.x
    }
    fn set_x(&mut self, value: f64) {
        self.x = value;
    }
    fn px(&self) -> f64 {
        self.px
    }
    fn set_px(&mut self, value: f64) {
        self.px = value;
    }
    fn y(&self) -> f64 {
        self.y
    }
    fn set_y(&mut self, value: f64) {
        self.y = value;
    }
    fn py(&self) -> f64 {
        self.py
    }
    fn set_py(&mut self, value: f64) {
        self.py = value;
    }
    fn s(&self) -> f64 {
        self.s
    }
    fn set_s(&mut self, value: f64) {
        self.s = value;
    }
    fn zeta(&self) -> f64 {
        self.zeta
    }
    fn set_zeta(&mut self, value: f64) {
        self.zeta = value;
    }
    fn delta(&self) -> f64 {
        self.delta
    }
    fn rvv(&self) -> f64 {
        self.rvv
    }
    fn state(&self) -> i64 {
        self.state
    }
    fn set_state(&mut self, value: i64) {
        self.state = value;
    }
    fn particle_id(&self) -> i64 {
        self.particle_id
    }
}
