//! Reference frames a particle passes through inside a collimator
//!
//! ```text
//! Lab ─┬─ zL ──▶ LeftSkew ─┬─ zDiff ──▶ RightSkew ── tilt, mirror ──▶ RightJaw
//!      │                   └──────────── tilt ─────────────────────▶ LeftJaw
//!      └─ zR ──▶ RightSkew
//! ```
//!
//! Every path is undone in reverse order so the particle always ends in
//! the lab frame. A miss never leaves the lab frame after the check.

use collkit_core::{s_rotation, LocalParticle};
use serde::{Deserialize, Serialize};

use crate::geometry::{CollimatorGeometry, Jaw, Rotation};

/// Frame the particle coordinates are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frame {
    /// Accelerator frame
    Lab,
    /// Rotated by the left skew angle
    LeftSkew,
    /// Rotated by the right skew angle
    RightSkew,
    /// Left tilt frame, origin at the upstream corner of the left face
    LeftJaw,
    /// Right tilt frame, origin at the upstream corner of the right face, x mirrored
    RightJaw,
}

/// Rotation-only frames used while looking for a crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkewFrame {
    Lab,
    Left,
    Right,
}

impl From<SkewFrame> for Frame {
    fn from(frame: SkewFrame) -> Self {
        match frame {
            SkewFrame::Lab => Frame::Lab,
            SkewFrame::Left => Frame::LeftSkew,
            SkewFrame::Right => Frame::RightSkew,
        }
    }
}

/// Result of the jaw check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitOutcome {
    /// Straight pass through the element
    NoHit,
    /// Particle reached the left jaw first
    HitLeft,
    /// Particle reached the right jaw first
    HitRight,
}

impl HitOutcome {
    /// The jaw that was hit, if any
    pub fn jaw(self) -> Option<Jaw> {
        match self {
            HitOutcome::NoHit => None,
            HitOutcome::HitLeft => Some(Jaw::Left),
            HitOutcome::HitRight => Some(Jaw::Right),
        }
    }

    /// Frame the particle is left in by the check
    pub fn frame(self) -> Frame {
        match self {
            HitOutcome::NoHit => Frame::Lab,
            HitOutcome::HitLeft => Frame::LeftJaw,
            HitOutcome::HitRight => Frame::RightJaw,
        }
    }

}

impl From<Jaw> for HitOutcome {
    fn from(jaw: Jaw) -> Self {
        match jaw {
            Jaw::Left => HitOutcome::HitLeft,
            Jaw::Right => HitOutcome::HitRight,
        }
    }
}

/// Rotate the particle from one skew frame to another and return the new frame.
///
/// With parallel jaws the left and right skew frames coincide, so moving
/// between them is free.
#[inline]
pub(crate) fn change_skew_frame<P: LocalParticle + ?Sized>(
    part: &mut P,
    geometry: &CollimatorGeometry,
    from: SkewFrame,
    to: SkewFrame,
) -> SkewFrame {
    let rotation = match (from, to) {
        (SkewFrame::Lab, SkewFrame::Left) => Some(geometry.skew_left()),
        (SkewFrame::Lab, SkewFrame::Right) => Some(geometry.skew_right()),
        (SkewFrame::Left, SkewFrame::Lab) => Some(geometry.skew_left().inverse()),
        (SkewFrame::Right, SkewFrame::Lab) => Some(geometry.skew_right().inverse()),
        (SkewFrame::Left, SkewFrame::Right) if !geometry.jaws_parallel() => {
            Some(geometry.skew_diff())
        }
        (SkewFrame::Right, SkewFrame::Left) if !geometry.jaws_parallel() => {
            Some(geometry.skew_diff().inverse())
        }
        _ => None,
    };
    if let Some(Rotation { sin, cos }) = rotation {
        s_rotation(part, sin, cos);
    }
    to
}
