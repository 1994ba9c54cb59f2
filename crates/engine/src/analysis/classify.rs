//! Tangent / transverse classification of curve-curve intersections.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::context::ModelContext;
use crate::error::{IntersectError, Outcome};
use crate::output::IntersectionOutput;
use crate::value::GeometryValue;

/// Mean approach angle below which an intersection is tangent.
pub const TANGENT_THRESHOLD: f64 = 5.0 * PI / 180.0;
/// Any single approach angle below this marks the intersection as grazing.
pub const GRAZING_THRESHOLD: f64 = 15.0 * PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationKind {
    Tangent,
    Transverse,
    /// The operand pair has no classification method.
    Unknown,
}

impl ClassificationKind {
    pub fn blend_score(self) -> f64 {
        match self {
            ClassificationKind::Tangent => 1.0,
            ClassificationKind::Transverse => 0.5,
            ClassificationKind::Unknown => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub kind: ClassificationKind,
    /// Angle between the tangent lines, in `[0, PI/2]`, at each point whose
    /// tangents were valid. Curve orientation does not matter.
    pub approach_angles: Vec<f64>,
    pub is_grazing: bool,
    pub blend_score: f64,
}

impl ClassificationResult {
    fn unknown() -> Self {
        Self {
            kind: ClassificationKind::Unknown,
            approach_angles: Vec::new(),
            is_grazing: false,
            blend_score: ClassificationKind::Unknown.blend_score(),
        }
    }
}

/// Mean of angles via their resultant vector, in `[0, 2*PI)`.
pub fn circular_mean(angles: &[f64]) -> f64 {
    let n = angles.len() as f64;
    let (s, c) = angles
        .iter()
        .fold((0.0, 0.0), |(s, c), a| (s + a.sin(), c + a.cos()));
    (s / n).atan2(c / n).rem_euclid(TAU)
}

/// Classify an intersection from the operands' tangents at each point.
///
/// Only curve-curve pairs are classified; other pairs return
/// [`ClassificationKind::Unknown`].
#[instrument(
    skip_all,
    fields(kind_a = %a.kind(), kind_b = %b.kind(), points = output.points.len())
)]
pub fn classify(
    output: &IntersectionOutput,
    a: &GeometryValue,
    b: &GeometryValue,
    ctx: &ModelContext,
) -> Outcome<ClassificationResult> {
    let n = output.points.len();
    if n == 0 {
        return Err(IntersectError::InsufficientData {
            reason: "intersection has no points".into(),
        }
        .into());
    }
    if output.parameters_a.len() < n || output.parameters_b.len() < n {
        return Err(IntersectError::InsufficientData {
            reason: format!(
                "{n} points but {} / {} parameters",
                output.parameters_a.len(),
                output.parameters_b.len()
            ),
        }
        .into());
    }

    let (Some(ca), Some(cb)) = (a.as_curve(), b.as_curve()) else {
        debug!("pair has no classification method");
        return Ok(ClassificationResult::unknown());
    };

    let angles: Vec<f64> = output.parameters_a[..n]
        .iter()
        .zip(&output.parameters_b[..n])
        .filter_map(|(pa, pb)| {
            let ta = ca.tangent(pa.as_curve()?)?;
            let tb = cb.tangent(pb.as_curve()?)?;
            let oriented = ta.angle_to(&tb);
            let angle = oriented.min(PI - oriented);
            if !angle.is_finite() {
                return None;
            }
            Some(if angle < ctx.angular_tolerance { 0.0 } else { angle })
        })
        .collect();

    if angles.is_empty() {
        return Err(IntersectError::ClassificationFailed {
            reason: format!("no valid tangent pair among {n} points"),
        }
        .into());
    }

    let mean = circular_mean(&angles);
    let kind = if mean < TANGENT_THRESHOLD {
        ClassificationKind::Tangent
    } else {
        ClassificationKind::Transverse
    };
    let is_grazing = angles.iter().any(|&a| a < GRAZING_THRESHOLD);
    debug!(?kind, mean_angle = mean, is_grazing, "classified");

    Ok(ClassificationResult {
        kind,
        approach_angles: angles,
        is_grazing,
        blend_score: kind.blend_score(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Param;
    use geo_kernel::geometry::{Line3d, Point3d};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_circular_mean_wraps() {
        let m = circular_mean(&[TAU - 0.1, 0.1]);
        assert!(m < 1e-12 || (TAU - m) < 1e-12);
        assert!((circular_mean(&[FRAC_PI_2, FRAC_PI_2]) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_missing_parameters_is_insufficient() {
        let out = IntersectionOutput {
            points: vec![Point3d::ORIGIN],
            ..Default::default()
        };
        let l = GeometryValue::Line(Line3d::new(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0)));
        let err = classify(&out, &l, &l, &ModelContext::default()).unwrap_err();
        assert!(matches!(err.first(), IntersectError::InsufficientData { .. }));
    }

    #[test]
    fn test_surface_parameters_on_curves_fail_classification() {
        let out = IntersectionOutput {
            points: vec![Point3d::ORIGIN],
            parameters_a: vec![Param::Surface { u: 0.0, v: 0.0 }],
            parameters_b: vec![Param::Curve(0.0)],
            ..Default::default()
        };
        let l = GeometryValue::Line(Line3d::new(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0)));
        let err = classify(&out, &l, &l, &ModelContext::default()).unwrap_err();
        assert!(matches!(err.first(), IntersectError::ClassificationFailed { .. }));
    }

    #[test]
    fn test_opposed_tangents_are_tangent() {
        let a = GeometryValue::Line(Line3d::new(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0)));
        let b = GeometryValue::Line(Line3d::new(Point3d::new(1.0, 0.0, 0.0), Point3d::ORIGIN));
        let out = IntersectionOutput {
            points: vec![Point3d::new(0.5, 0.0, 0.0)],
            parameters_a: vec![Param::Curve(0.5)],
            parameters_b: vec![Param::Curve(0.5)],
            ..Default::default()
        };
        let r = classify(&out, &a, &b, &ModelContext::default()).unwrap();
        assert!(r.approach_angles[0].abs() < 1e-9);
        assert_eq!(r.kind, ClassificationKind::Tangent);
        assert!(r.is_grazing);
        assert_eq!(r.blend_score, 1.0);
    }
}
