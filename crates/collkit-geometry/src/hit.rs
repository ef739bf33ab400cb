//! Jaw hit detection and the reverse transform
//!
//! The two entry points bracket the jaw physics of a collimator:
//!
//! 1. [`hit_jaws_check_and_transform`] finds the first jaw crossing, moves the
//!    particle to the impact point and into that jaw's frame (or drifts it
//!    through the whole element on a miss).
//! 2. The caller evaluates jaw physics in the jaw frame.
//! 3. [`hit_jaws_transform_back`] undoes the jaw frame, drifts a surviving
//!    particle to the end of the element and restores the lab frame.
//!
//! Both calls are pure arithmetic on one particle; they may run concurrently
//! for different particles against the same geometry.

use collkit_core::{drift, s_rotation, xy_shift, y_rotation_rotate_only, LocalParticle};

use crate::frame::{change_skew_frame, Frame, HitOutcome, SkewFrame};
use crate::geometry::{CollimatorGeometry, Jaw};
use crate::polygon::first_crossing;

/// Tie-break between the two jaws.
///
/// The right jaw wins only with a valid crossing strictly before the left
/// one; equal distances go to the left jaw.
#[inline]
pub fn right_jaw_first(s_left: Option<f64>, s_right: Option<f64>) -> bool {
    match (s_left, s_right) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(left), Some(right)) => right < left,
    }
}

/// Check whether the particle hits a jaw and move it into that jaw's frame.
///
/// The particle's `s` must be measured from the element entrance.
/// - `HitLeft`/`HitRight`: the particle sits at the impact point, in the
///   tilt frame of the jaw (x = 0 on the face, material at x > 0).
/// - `NoHit`: the particle has drifted the full element length in the lab frame.
pub fn hit_jaws_check_and_transform<P: LocalParticle + ?Sized>(
    part: &mut P,
    geometry: &CollimatorGeometry,
) -> HitOutcome {
    let side = geometry.side();
    let mut frame = SkewFrame::Lab;
    let mut s_left = None;
    let mut s_right = None;

    if side.has_left() {
        frame = change_skew_frame(part, geometry, frame, SkewFrame::Left);
        s_left = first_crossing(
            part.x(),
            part.transverse_slope(),
            &geometry.face(Jaw::Left),
            geometry.tilt_left().tan,
            Jaw::Left,
        );
        if s_left.is_none() && !side.has_right() {
            frame = change_skew_frame(part, geometry, frame, SkewFrame::Lab);
        }
    }

    if side.has_right() {
        frame = change_skew_frame(part, geometry, frame, SkewFrame::Right);
        s_right = first_crossing(
            part.x(),
            part.transverse_slope(),
            &geometry.face(Jaw::Right),
            geometry.tilt_right().tan,
            Jaw::Right,
        );
        if !right_jaw_first(s_left, s_right) {
            let back_to = if s_left.is_some() {
                SkewFrame::Left
            } else {
                SkewFrame::Lab
            };
            frame = change_skew_frame(part, geometry, frame, back_to);
        }
    }

    let hit = if right_jaw_first(s_left, s_right) {
        s_right.map(|s| (Jaw::Right, s))
    } else {
        s_left.map(|s| (Jaw::Left, s))
    };

    match hit {
        Some((jaw, s_hit)) => {
            debug_assert_eq!(
                Frame::from(frame),
                match jaw {
                    Jaw::Left => Frame::LeftSkew,
                    Jaw::Right => Frame::RightSkew,
                }
            );
            let entered = enter_jaw(part, geometry, jaw, s_hit);
            let outcome = HitOutcome::from(jaw);
            debug_assert_eq!(outcome.frame(), entered);
            outcome
        }
        None => {
            debug_assert_eq!(frame, SkewFrame::Lab);
            drift(part, geometry.length());
            HitOutcome::NoHit
        }
    }
}

/// Undo [`hit_jaws_check_and_transform`] after the jaw physics ran.
///
/// Must be called exactly once with the outcome returned by the check. A
/// particle whose state is no longer positive is not drifted to the end of
/// the element. No-op for `NoHit`.
pub fn hit_jaws_transform_back<P: LocalParticle + ?Sized>(
    outcome: HitOutcome,
    part: &mut P,
    geometry: &CollimatorGeometry,
) {
    let Some(jaw) = outcome.jaw() else {
        return;
    };
    let tilt = geometry.tilt(jaw);
    let skew = geometry.skew(jaw);

    if jaw == Jaw::Right {
        part.scale_x(-1.0);
        part.scale_px(-1.0);
    }

    let s = part.s();
    let new_s = y_rotation_rotate_only(part, s, -tilt.angle);
    part.set_s(new_s);

    xy_shift(part, -geometry.upstream_corner(jaw), 0.0);
    part.add_to_s(tilt.face_start(geometry.length()));

    if part.is_alive() {
        let remaining = geometry.length() - part.s();
        drift(part, remaining);
    }

    let back = skew.inverse();
    s_rotation(part, back.sin, back.cos);
}

/// Drift to the impact point and switch to the jaw's tilt frame.
fn enter_jaw<P: LocalParticle + ?Sized>(
    part: &mut P,
    geometry: &CollimatorGeometry,
    jaw: Jaw,
    s_hit: f64,
) -> Frame {
    let tilt = geometry.tilt(jaw);

    drift(part, s_hit);
    xy_shift(part, geometry.upstream_corner(jaw), 0.0);
    part.add_to_s(-tilt.face_start(geometry.length()));

    let s = part.s();
    let new_s = y_rotation_rotate_only(part, s, tilt.angle);
    part.set_s(new_s);

    let frame = match jaw {
        Jaw::Left => Frame::LeftJaw,
        Jaw::Right => {
            part.scale_x(-1.0);
            part.scale_px(-1.0);
            Frame::RightJaw
        }
    };

    tracing::trace!(
        particle = part.particle_id(),
        %jaw,
        s_hit,
        "particle enters jaw"
    );
    geometry.log_interaction(part, jaw.enter_interaction());
    frame
}
