//! Straight-line crossing with an open jaw polygon
//!
//! A jaw is described in its skew frame by the two end points of its face,
//! `(s0, x0)` upstream and `(s1, x1)` downstream. The polygon is *open*: the
//! face segment is closed off at both ends by semi-infinite flanks that run
//! perpendicular to the face into the jaw material,
//!
//! ```text
//!     s(x) = s_v - (x - x_v) * tan(tilt),   orientation * (x - x_v) >= 0
//! ```
//!
//! so a particle that is already beyond the face when it enters the element
//! is caught by the upstream flank instead of slipping through.

use collkit_core::constants::{CROSSING_THRESHOLD, NO_CROSSING};

use crate::geometry::Jaw;

/// Denominators below this magnitude are treated as parallel lines.
const PARALLEL_TOLERANCE: f64 = 1.0e-15;

/// Two-vertex open polygon in (s, x) space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPolygon {
    /// Longitudinal coordinates of the vertices
    pub s: [f64; 2],
    /// Transverse coordinates of the vertices
    pub x: [f64; 2],
}

impl OpenPolygon {
    /// Create a polygon from its vertex coordinates
    pub fn new(s: [f64; 2], x: [f64; 2]) -> Self {
        Self { s, x }
    }
}

/// Distance along `s` to the first forward crossing of the line
/// `x(s) = part_x + part_tan * s` with the polygon, or `None`.
///
/// `tan_tilt` is the tangent of the jaw tilt (it sets the flank direction)
/// and `orientation` says on which side of the face the material lies.
pub fn first_crossing(
    part_x: f64,
    part_tan: f64,
    polygon: &OpenPolygon,
    tan_tilt: f64,
    orientation: Jaw,
) -> Option<f64> {
    let sign = orientation.orientation();
    let [s0, s1] = polygon.s;
    let [x0, x1] = polygon.x;

    let upstream = crossing_with_flank(part_x, part_tan, s0, x0, tan_tilt, sign);
    let downstream = crossing_with_flank(part_x, part_tan, s1, x1, tan_tilt, sign);

    // A tilted upstream flank leans over the entrance: a particle that crossed
    // it behind s = 0 and has not left through the downstream flank since is
    // already inside the jaw.
    let forward = 1.0 + part_tan * tan_tilt > 0.0;
    if let Some(s_up) = upstream.filter(|s| forward && *s < 0.0) {
        let left_again = downstream.is_some_and(|s_down| s_down > s_up && s_down < 0.0);
        if !left_again {
            return Some(0.0);
        }
    }

    [
        upstream,
        crossing_with_segment(part_x, part_tan, s0, x0, s1, x1),
        downstream,
    ]
    .into_iter()
    .flatten()
    .filter(|s| *s >= 0.0 && *s < CROSSING_THRESHOLD)
    .min_by(|a, b| a.total_cmp(b))
}

/// [`first_crossing`] in sentinel form: `NO_CROSSING` (1e21) when absent.
pub fn first_crossing_distance(
    part_x: f64,
    part_tan: f64,
    polygon: &OpenPolygon,
    tan_tilt: f64,
    orientation: Jaw,
) -> f64 {
    first_crossing(part_x, part_tan, polygon, tan_tilt, orientation).unwrap_or(NO_CROSSING)
}

/// Convert a sentinel distance back to an optional crossing.
pub fn crossing_from_distance(distance: f64) -> Option<f64> {
    (distance < CROSSING_THRESHOLD).then_some(distance)
}

fn crossing_with_segment(
    part_x: f64,
    part_tan: f64,
    s0: f64,
    x0: f64,
    s1: f64,
    x1: f64,
) -> Option<f64> {
    let ds = s1 - s0;
    if !(ds > 0.0) {
        return None;
    }
    let seg_tan = (x1 - x0) / ds;
    let denom = part_tan - seg_tan;
    if denom.abs() <= PARALLEL_TOLERANCE * (1.0 + part_tan.abs().max(seg_tan.abs())) {
        return None;
    }
    let s = (x0 - seg_tan * s0 - part_x) / denom;
    (s.is_finite() && s >= s0 && s <= s1).then_some(s)
}

fn crossing_with_flank(
    part_x: f64,
    part_tan: f64,
    s_v: f64,
    x_v: f64,
    tan_tilt: f64,
    sign: f64,
) -> Option<f64> {
    let denom = 1.0 + part_tan * tan_tilt;
    if denom.abs() <= PARALLEL_TOLERANCE {
        return None;
    }
    let s = (s_v - (part_x - x_v) * tan_tilt) / denom;
    if !s.is_finite() {
        return None;
    }
    let x = part_x + part_tan * s;
    (sign * (x - x_v) >= 0.0).then_some(s)
}
