//! Collimator geometry
//!
//! A [`CollimatorGeometry`] is built once per collimator and then shared,
//! read-only, by every particle tracked through that collimator. All the
//! trigonometry the hit detector needs is computed here so that the per
//! particle path is pure arithmetic.
//!
//! Conventions:
//! - The left jaw sits at positive `x` and its material extends to `+x`; the
//!   right jaw sits at negative `x` with material towards `-x`.
//! - Skew angles rotate a jaw about the beam axis, tilt angles rotate it about
//!   the vertical axis through the middle of the element.
//! - `U`/`D` corners are the face offsets at the upstream/downstream end.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use collkit_core::constants::{MIN_TILT_COSINE, TRIG_TOLERANCE};
use collkit_core::{
    ConfigError, GeometryError, InteractionSink, InteractionType, LocalParticle, ParticleSnapshot,
};

use crate::polygon::OpenPolygon;

/// Which jaws of a collimator are physically present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JawSide {
    /// Only the left jaw
    #[serde(rename = "left")]
    LeftOnly,
    /// Only the right jaw
    #[serde(rename = "right")]
    RightOnly,
    /// Both jaws
    #[serde(rename = "both")]
    Both,
}

impl JawSide {
    /// Whether the left jaw is present
    pub fn has_left(self) -> bool {
        !matches!(self, JawSide::RightOnly)
    }

    /// Whether the right jaw is present
    pub fn has_right(self) -> bool {
        !matches!(self, JawSide::LeftOnly)
    }
}

impl Default for JawSide {
    fn default() -> Self {
        Self::Both
    }
}

impl fmt::Display for JawSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JawSide::LeftOnly => write!(f, "left"),
            JawSide::RightOnly => write!(f, "right"),
            JawSide::Both => write!(f, "both"),
        }
    }
}

impl FromStr for JawSide {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" | "l" | "+" => Ok(JawSide::LeftOnly),
            "right" | "r" | "-" => Ok(JawSide::RightOnly),
            "both" | "+-" | "-+" => Ok(JawSide::Both),
            _ => Err(ConfigError::UnknownSide {
                value: s.to_string(),
            }),
        }
    }
}

/// One of the two jaws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Jaw {
    /// Jaw at positive x
    Left,
    /// Jaw at negative x
    Right,
}

impl Jaw {
    /// Direction from the jaw face into the jaw material along x
    pub fn orientation(self) -> f64 {
        match self {
            Jaw::Left => 1.0,
            Jaw::Right => -1.0,
        }
    }

    /// Interaction logged when a particle reaches this jaw
    pub fn enter_interaction(self) -> InteractionType {
        match self {
            Jaw::Left => InteractionType::EnterJawLeft,
            Jaw::Right => InteractionType::EnterJawRight,
        }
    }
}

impl fmt::Display for Jaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Jaw::Left => write!(f, "left"),
            Jaw::Right => write!(f, "right"),
        }
    }
}

/// Sine and cosine of a rotation about the beam axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    /// Sine of the angle
    pub sin: f64,
    /// Cosine of the angle
    pub cos: f64,
}

impl Rotation {
    /// No rotation
    pub const IDENTITY: Rotation = Rotation { sin: 0.0, cos: 1.0 };

    /// Precompute a rotation from an angle in radians
    pub fn from_angle(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { sin, cos }
    }

    /// The opposite rotation
    pub fn inverse(self) -> Self {
        Self {
            sin: -self.sin,
            cos: self.cos,
        }
    }

    /// Angle in radians
    pub fn angle(self) -> f64 {
        self.sin.atan2(self.cos)
    }

    fn is_normalised(self) -> bool {
        (self.sin * self.sin + self.cos * self.cos - 1.0).abs() <= TRIG_TOLERANCE
    }
}

/// Precomputed trigonometry of a jaw tilt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tilt {
    /// Sine of the tilt
    pub sin: f64,
    /// Cosine of the tilt
    pub cos: f64,
    /// Tangent of the tilt
    pub tan: f64,
    /// `asin(sin)`, the rotation into the jaw frame
    pub angle: f64,
}

impl Tilt {
    /// An untilted jaw
    pub const FLAT: Tilt = Tilt {
        sin: 0.0,
        cos: 1.0,
        tan: 0.0,
        angle: 0.0,
    };

    /// Precompute a tilt from its sine, taking the positive cosine branch
    pub fn from_sin(sin: f64) -> Self {
        let cos = (1.0 - sin * sin).max(0.0).sqrt();
        Self {
            sin,
            cos,
            tan: sin / cos,
            angle: sin.asin(),
        }
    }

    /// Distance from the element entrance to the upstream end of the tilted face
    pub fn face_start(&self, length: f64) -> f64 {
        length / 2.0 * (1.0 - self.cos)
    }

    /// Distance from the element entrance to the downstream end of the tilted face
    pub fn face_end(&self, length: f64) -> f64 {
        length / 2.0 * (1.0 + self.cos)
    }

    fn check(&self, jaw: Jaw) -> Result<(), GeometryError> {
        if !(self.cos.abs() > MIN_TILT_COSINE) {
            return Err(GeometryError::DegenerateTilt {
                jaw: jaw.to_string(),
                cos: self.cos,
            });
        }
        if (self.sin * self.sin + self.cos * self.cos - 1.0).abs() > TRIG_TOLERANCE {
            return Err(GeometryError::InconsistentTrig {
                field: format!("tilt_{}", jaw),
                reason: "sin² + cos² != 1".to_string(),
            });
        }
        if (self.tan - self.sin / self.cos).abs() > TRIG_TOLERANCE * (1.0 + self.tan.abs()) {
            return Err(GeometryError::InconsistentTrig {
                field: format!("tilt_{}", jaw),
                reason: "tan != sin / cos".to_string(),
            });
        }
        Ok(())
    }
}

/// Face offsets of one jaw at both ends of the element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JawCorners {
    /// Offset at the upstream end
    pub upstream: f64,
    /// Offset at the downstream end
    pub downstream: f64,
}

impl JawCorners {
    /// Create corners from explicit offsets
    pub fn new(upstream: f64, downstream: f64) -> Self {
        Self {
            upstream,
            downstream,
        }
    }

    /// Corners of a jaw centred at `position` and tilted by `tilt` radians
    pub fn from_center(position: f64, tilt: f64, length: f64) -> Self {
        let half_rise = length / 2.0 * tilt.sin();
        Self {
            upstream: position - half_rise,
            downstream: position + half_rise,
        }
    }
}

/// Skew angles of both jaws, in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SkewAngles {
    /// Skew of the left jaw
    pub left: f64,
    /// Skew of the right jaw
    pub right: f64,
}

impl SkewAngles {
    /// Both jaws at the same skew
    pub fn parallel(angle: f64) -> Self {
        Self {
            left: angle,
            right: angle,
        }
    }
}

/// Immutable, precomputed geometry of one collimator
#[derive(Clone)]
pub struct CollimatorGeometry {
    jaw_lu: f64,
    jaw_ld: f64,
    jaw_ru: f64,
    jaw_rd: f64,
    length: f64,
    side: JawSide,
    skew_left: Rotation,
    skew_right: Rotation,
    skew_diff: Rotation,
    jaws_parallel: bool,
    tilt_left: Tilt,
    tilt_right: Tilt,
    record: Option<Arc<dyn InteractionSink>>,
    record_touches: bool,
}

impl CollimatorGeometry {
    /// Build a geometry from the jaw corners.
    ///
    /// Tilts are derived from the corners (`sin = (D - U) / length`) so the
    /// jaw face and the jaw frame always agree.
    pub fn new(
        length: f64,
        side: JawSide,
        left: JawCorners,
        right: JawCorners,
        skew: SkewAngles,
    ) -> Result<Self, GeometryError> {
        if !(length.is_finite() && length > 0.0) {
            return Err(GeometryError::InvalidLength { length });
        }
        for (field, value) in [
            ("jaw_LU", left.upstream),
            ("jaw_LD", left.downstream),
            ("jaw_RU", right.upstream),
            ("jaw_RD", right.downstream),
            ("skew_left", skew.left),
            ("skew_right", skew.right),
        ] {
            if !value.is_finite() {
                return Err(GeometryError::NonFinite {
                    field: field.to_string(),
                    value,
                });
            }
        }

        let tilt_left = Tilt::from_sin((left.downstream - left.upstream) / length);
        let tilt_right = Tilt::from_sin((right.downstream - right.upstream) / length);
        if side.has_left() {
            tilt_left.check(Jaw::Left)?;
        }
        if side.has_right() {
            tilt_right.check(Jaw::Right)?;
        }

        let geometry = Self {
            jaw_lu: left.upstream,
            jaw_ld: left.downstream,
            jaw_ru: right.upstream,
            jaw_rd: right.downstream,
            length,
            side,
            skew_left: Rotation::from_angle(skew.left),
            skew_right: Rotation::from_angle(skew.right),
            skew_diff: Rotation::from_angle(skew.right - skew.left),
            jaws_parallel: skew.left == skew.right,
            tilt_left,
            tilt_right,
            record: None,
            record_touches: false,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Build a geometry from jaw centre positions and tilt angles (radians)
    pub fn from_jaws(
        length: f64,
        side: JawSide,
        jaw_left: f64,
        jaw_right: f64,
        skew: SkewAngles,
        tilt_left: f64,
        tilt_right: f64,
    ) -> Result<Self, GeometryError> {
        for (field, value) in [("tilt_left", tilt_left), ("tilt_right", tilt_right)] {
            if !value.is_finite() {
                return Err(GeometryError::NonFinite {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Self::new(
            length,
            side,
            JawCorners::from_center(jaw_left, tilt_left, length),
            JawCorners::from_center(jaw_right, tilt_right, length),
            skew,
        )
    }

    /// Disable the parallel-jaw shortcut, always rotating by the skew difference
    pub fn without_parallel_fast_path(mut self) -> Self {
        self.jaws_parallel = false;
        self
    }

    /// Attach an interaction sink and enable logging of jaw touches
    pub fn with_record(mut self, sink: Arc<dyn InteractionSink>) -> Self {
        self.record = Some(sink);
        self.record_touches = true;
        self
    }

    /// Enable or disable logging without detaching the sink
    pub fn record_touches(mut self, enabled: bool) -> Self {
        self.record_touches = enabled;
        self
    }

    /// Check the invariants of the precomputed values
    pub fn validate(&self) -> Result<(), GeometryError> {
        for (field, rotation) in [
            ("skew_left", self.skew_left),
            ("skew_right", self.skew_right),
            ("skew_diff", self.skew_diff),
        ] {
            if !rotation.is_normalised() {
                return Err(GeometryError::InconsistentTrig {
                    field: field.to_string(),
                    reason: "sin² + cos² != 1".to_string(),
                });
            }
        }
        if self.jaws_parallel
            && ((self.skew_left.sin - self.skew_right.sin).abs() > TRIG_TOLERANCE
                || (self.skew_left.cos - self.skew_right.cos).abs() > TRIG_TOLERANCE)
        {
            return Err(GeometryError::NotParallel {
                sin_left: self.skew_left.sin,
                sin_right: self.skew_right.sin,
            });
        }
        if self.side.has_left() {
            self.tilt_left.check(Jaw::Left)?;
        }
        if self.side.has_right() {
            self.tilt_right.check(Jaw::Right)?;
        }
        Ok(())
    }

    /// Upstream corner of the left jaw
    pub fn jaw_lu(&self) -> f64 {
        self.jaw_lu
    }

    /// Downstream corner of the left jaw
    pub fn jaw_ld(&self) -> f64 {
        self.jaw_ld
    }

    /// Upstream corner of the right jaw
    pub fn jaw_ru(&self) -> f64 {
        self.jaw_ru
    }

    /// Downstream corner of the right jaw
    pub fn jaw_rd(&self) -> f64 {
        self.jaw_rd
    }

    /// Nominal element length
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Jaws present
    pub fn side(&self) -> JawSide {
        self.side
    }

    /// Skew of the left jaw
    pub fn skew_left(&self) -> Rotation {
        self.skew_left
    }

    /// Skew of the right jaw
    pub fn skew_right(&self) -> Rotation {
        self.skew_right
    }

    /// Rotation from the left skew frame to the right skew frame
    pub fn skew_diff(&self) -> Rotation {
        self.skew_diff
    }

    /// Whether both jaws share the same skew frame
    pub fn jaws_parallel(&self) -> bool {
        self.jaws_parallel
    }

    /// Tilt of the left jaw
    pub fn tilt_left(&self) -> Tilt {
        self.tilt_left
    }

    /// Tilt of the right jaw
    pub fn tilt_right(&self) -> Tilt {
        self.tilt_right
    }

    /// Whether jaw touches are logged
    pub fn is_recording(&self) -> bool {
        self.record_touches && self.record.is_some()
    }

    /// Upstream corner of a jaw
    pub fn upstream_corner(&self, jaw: Jaw) -> f64 {
        match jaw {
            Jaw::Left => self.jaw_lu,
            Jaw::Right => self.jaw_ru,
        }
    }

    /// Tilt of a jaw
    pub fn tilt(&self, jaw: Jaw) -> Tilt {
        match jaw {
            Jaw::Left => self.tilt_left,
            Jaw::Right => self.tilt_right,
        }
    }

    /// Skew of a jaw
    pub fn skew(&self, jaw: Jaw) -> Rotation {
        match jaw {
            Jaw::Left => self.skew_left,
            Jaw::Right => self.skew_right,
        }
    }

    /// Face of a jaw as a two-vertex open polygon in its skew frame
    pub fn face(&self, jaw: Jaw) -> OpenPolygon {
        let tilt = self.tilt(jaw);
        let (upstream, downstream) = match jaw {
            Jaw::Left => (self.jaw_lu, self.jaw_ld),
            Jaw::Right => (self.jaw_ru, self.jaw_rd),
        };
        OpenPolygon::new(
            [tilt.face_start(self.length), tilt.face_end(self.length)],
            [upstream, downstream],
        )
    }

    /// Log an interaction if recording is enabled
    pub fn log_interaction<P: LocalParticle + ?Sized>(
        &self,
        part: &P,
        interaction: InteractionType,
    ) {
        if !self.record_touches {
            return;
        }
        if let Some(sink) = &self.record {
            sink.log(interaction, ParticleSnapshot::capture(part));
        }
    }
}

impl fmt::Debug for CollimatorGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollimatorGeometry")
            .field("jaw_lu", &self.jaw_lu)
            .field("jaw_ld", &self.jaw_ld)
            .field("jaw_ru", &self.jaw_ru)
            .field("jaw_rd", &self.jaw_rd)
            .field("length", &self.length)
            .field("side", &self.side)
            .field("skew_left", &self.skew_left)
            .field("skew_right", &self.skew_right)
            .field("skew_diff", &self.skew_diff)
            .field("jaws_parallel", &self.jaws_parallel)
            .field("tilt_left", &self.tilt_left)
            .field("tilt_right", &self.tilt_right)
            .field("record_touches", &self.is_recording())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn flat(side: JawSide) -> CollimatorGeometry {
        CollimatorGeometry::new(
            1.0,
            side,
            JawCorners::new(2.0e-3, 2.0e-3),
            JawCorners::new(-2.0e-3, -2.0e-3),
            SkewAngles::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_side_flags() {
        assert!(JawSide::LeftOnly.has_left());
        assert!(!JawSide::LeftOnly.has_right());
        assert!(!JawSide::RightOnly.has_left());
        assert!(JawSide::RightOnly.has_right());
        assert!(JawSide::Both.has_left() && JawSide::Both.has_right());
    }

    #[test]
    fn test_side_parsing() {
        assert_eq!("left".parse::<JawSide>().unwrap(), JawSide::LeftOnly);
        assert_eq!("-".parse::<JawSide>().unwrap(), JawSide::RightOnly);
        assert_eq!(" Both ".parse::<JawSide>().unwrap(), JawSide::Both);
        assert!("up".parse::<JawSide>().is_err());
    }

    #[test]
    fn test_flat_geometry() {
        let g = flat(JawSide::Both);
        assert!(g.jaws_parallel());
        assert_eq!(g.tilt_left(), Tilt::FLAT);
        assert_eq!(g.skew_diff(), Rotation::IDENTITY);
        assert!(!g.is_recording());
    }

    #[test]
    fn test_from_jaws_corners_follow_tilt() {
        let tilt = 1.0e-3_f64;
        let g = CollimatorGeometry::from_jaws(
            0.6,
            JawSide::Both,
            1.5e-3,
            -1.5e-3,
            SkewAngles::parallel(0.0),
            tilt,
            -tilt,
        )
        .unwrap();
        assert_abs_diff_eq!(g.jaw_ld() - g.jaw_lu(), 0.6 * tilt.sin(), epsilon = 1e-15);
        assert_abs_diff_eq!(g.tilt_left().sin, tilt.sin(), epsilon = 1e-15);
        assert_abs_diff_eq!(g.tilt_right().angle, -tilt, epsilon = 1e-15);
    }

    #[test]
    fn test_skew_difference() {
        let g = CollimatorGeometry::new(
            1.0,
            JawSide::Both,
            JawCorners::new(1.0e-3, 1.0e-3),
            JawCorners::new(-1.0e-3, -1.0e-3),
            SkewAngles {
                left: 0.2,
                right: 0.5,
            },
        )
        .unwrap();
        assert!(!g.jaws_parallel());
        assert_abs_diff_eq!(g.skew_diff().angle(), 0.3, epsilon = 1e-15);
    }

    #[test]
    fn test_invalid_length_rejected() {
        let err = CollimatorGeometry::new(
            0.0,
            JawSide::Both,
            JawCorners::new(0.0, 0.0),
            JawCorners::new(0.0, 0.0),
            SkewAngles::default(),
        )
        .unwrap_err();
        assert_eq!(err, GeometryError::InvalidLength { length: 0.0 });
    }

    #[test]
    fn test_degenerate_tilt_rejected() {
        // D - U equal to the full length is a jaw face perpendicular to the beam
        let err = CollimatorGeometry::new(
            1.0,
            JawSide::LeftOnly,
            JawCorners::new(0.0, 1.0),
            JawCorners::new(0.0, 0.0),
            SkewAngles::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::DegenerateTilt { .. }));
    }

    #[test]
    fn test_unused_jaw_is_not_checked() {
        let g = CollimatorGeometry::new(
            1.0,
            JawSide::LeftOnly,
            JawCorners::new(1.0e-3, 1.0e-3),
            JawCorners::new(0.0, 1.0),
            SkewAngles::default(),
        );
        assert!(g.is_ok());
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = CollimatorGeometry::new(
            1.0,
            JawSide::Both,
            JawCorners::new(f64::NAN, 0.0),
            JawCorners::new(0.0, 0.0),
            SkewAngles::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::NonFinite { .. }));
    }

    #[test]
    fn test_face_polygon() {
        let g = CollimatorGeometry::from_jaws(
            2.0,
            JawSide::Both,
            1.0e-3,
            -1.0e-3,
            SkewAngles::default(),
            0.0,
            0.0,
        )
        .unwrap();
        let face = g.face(Jaw::Right);
        assert_eq!(face.s, [0.0, 2.0]);
        assert_eq!(face.x, [-1.0e-3, -1.0e-3]);
    }

    #[test]
    fn test_without_parallel_fast_path() {
        let g = flat(JawSide::Both).without_parallel_fast_path();
        assert!(!g.jaws_parallel());
        assert!(g.validate().is_ok());
    }
}
