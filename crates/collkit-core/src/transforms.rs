//! Field-free frame primitives
//!
//! These are the only operations the jaw kernel uses to move a particle
//! between frames. Each one has an exact inverse:
//! - `s_rotation(sin, cos)` is undone by `s_rotation(-sin, cos)`
//! - `xy_shift(dx, dy)` by `xy_shift(-dx, -dy)`
//! - `y_rotation_rotate_only(s, a)` by `y_rotation_rotate_only(s', -a)`
//! - `drift(l)` by `drift(-l)`

use crate::particle::{longitudinal_momentum, LocalParticle};

/// Rotate the transverse plane about the longitudinal axis.
///
/// Takes the precomputed sine and cosine of the rotation angle.
#[inline]
pub fn s_rotation<P: LocalParticle + ?Sized>(part: &mut P, sin_z: f64, cos_z: f64) {
    let x = part.x();
    let y = part.y();
    let px = part.px();
    let py = part.py();

    part.set_x(cos_z * x + sin_z * y);
    part.set_y(-sin_z * x + cos_z * y);
    part.set_px(cos_z * px + sin_z * py);
    part.set_py(-sin_z * px + cos_z * py);
}

/// Field-free drift over `length`, holding the momenta fixed.
#[inline]
pub fn drift<P: LocalParticle + ?Sized>(part: &mut P, length: f64) {
    let rvv = part.rvv();

    let (xp, yp, dzeta) = if cfg!(feature = "exact-drifts") {
        let one_plus_delta = 1.0 + part.delta();
        let pz = longitudinal_momentum(part);
        (part.exact_xp(), part.exact_yp(), rvv - one_plus_delta / pz)
    } else {
        let rpp = part.rpp();
        let xp = part.px() * rpp;
        let yp = part.py() * rpp;
        (xp, yp, 1.0 - rvv * (1.0 + (xp * xp + yp * yp) / 2.0))
    };

    part.set_x(part.x() + xp * length);
    part.set_y(part.y() + yp * length);
    part.add_to_s(length);
    part.set_zeta(part.zeta() + length * dzeta);
}

/// Move the transverse origin to `(dx, dy)`.
#[inline]
pub fn xy_shift<P: LocalParticle + ?Sized>(part: &mut P, dx: f64, dy: f64) {
    part.set_x(part.x() - dx);
    part.set_y(part.y() - dy);
}

/// Rotate the (s, x) plane by `angle` about the vertical axis.
///
/// `s` is the particle's longitudinal coordinate in the current frame; the
/// particle's own `s` is not touched. Returns the longitudinal coordinate in
/// the rotated frame so the caller decides where to store it. The rotated
/// frame sees a line `x = s·tan(angle)` as `x' = 0`.
#[inline]
pub fn y_rotation_rotate_only<P: LocalParticle + ?Sized>(part: &mut P, s: f64, angle: f64) -> f64 {
    let x = part.x();
    let rpp = part.rpp();
    let xp = part.px() * rpp;
    let (sin_y, cos_y) = angle.sin_cos();
    let tan_y = sin_y / cos_y;

    part.set_x(x * cos_y - s * sin_y);
    part.set_px((xp - tan_y) / (1.0 + xp * tan_y) / rpp);

    x * sin_y + s * cos_y
}
