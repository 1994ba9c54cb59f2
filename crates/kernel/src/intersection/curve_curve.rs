//! Generic curve-curve intersection for any pair of [`ParametricCurve`]s.
//!
//! Both curves are sampled into polylines; segment pairs that come close seed
//! a Gauss-Newton solve of `A(s) - B(t) = 0` in the two parameters.

use nalgebra::{Matrix2, Vector2};
use tracing::debug;

use crate::Tolerance;
use crate::geometry::point::Point3d;
use crate::geometry::vector::Vec3;
use crate::traits::ParametricCurve;

use super::{CurveCurveHit, dedupe_by_point};

/// Polyline resolution per curve.
const SEGMENTS: usize = 128;
const NEWTON_ITERATIONS: usize = 60;

/// Closest points between segments `p0-p1` and `q0-q1` as segment fractions.
pub fn segment_segment_closest(
    p0: &Point3d,
    p1: &Point3d,
    q0: &Point3d,
    q1: &Point3d) -> (f64, f64,
) {
    let d1 = *p1 - *p0;
    let d2 = *q1 - *q0;
    let r = *p0 - *q0;
    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    let f = d2.dot(&r);

    if a < 1e-30 && e < 1e-30 {
        return (0.0, 0.0);
    }
    if a < 1e-30 {
        return (0.0, (f / e).clamp(0.0, 1.0));
    }
    let c = d1.dot(&r);
    if e < 1e-30 {
        return ((-c / a).clamp(0.0, 1.0), 0.0);
    }
    let b = d1.dot(&d2);
    let denom = a * e - b * b;
    let mut s = if denom > 1e-30 {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut t = (b * s + f) / e;
    if t < 0.0 {
        t = 0.0;
        s = (-c / a).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((b - c) / a).clamp(0.0, 1.0);
    }
    (s, t)
}

/// Gauss-Newton on `|A(s) - B(t)|^2` from `(s, t)`, clamped to both domains.
/// Returns the refined parameters and the final separation.
pub fn refine_curve_pair<A, B>(a: &A, b: &B, mut s: f64, mut t: f64) -> (f64, f64, f64)
where
    A: ParametricCurve + ?Sized,
    B: ParametricCurve + ?Sized,
{
    let (s0, s1) = a.domain();
    let (t0, t1) = b.domain();
    for _ in 0..NEWTON_ITERATIONS {
        let r: Vec3 = a.evaluate(s) - b.evaluate(t);
        let da = a.derivative(s);
        let db = -b.derivative(t);
        let jtj = Matrix2::new(da.dot(&da), da.dot(&db), db.dot(&da), db.dot(&db));
        let jtr = Vector2::new(da.dot(&r), db.dot(&r));
        let Some(inv) = jtj.try_inverse() else {
            break;
        };
        let step = inv * jtr;
        let ns = (s - step[0]).clamp(s0, s1);
        let nt = (t - step[1]).clamp(t0, t1);
        let moved = (ns - s).abs() + (nt - t).abs();
        s = ns;
        t = nt;
        if !moved.is_finite() || moved < 1e-15 {
            break;
        }
    }
    (s, t, a.evaluate(s).distance_to(&b.evaluate(t)))
}

/// All isolated intersection points of two curves, ordered by the parameter
/// on `a`. Overlapping stretches show up as a run of nearby hits rather than
/// as an overlap curve.
pub fn curve_curve<A, B>(a: &A, b: &B, tol: &Tolerance) -> Vec<CurveCurveHit>
where
    A: ParametricCurve + ?Sized,
    B: ParametricCurve + ?Sized,
{
    let sa = a.sample(SEGMENTS + 1);
    let sb = b.sample(SEGMENTS + 1);
    let mut hits = Vec::new();

    for wa in sa.windows(2) {
        let (ta0, pa0) = wa[0];
        let (ta1, pa1) = wa[1];
        let len_a = pa0.distance_to(&pa1);
        for wb in sb.windows(2) {
            let (tb0, pb0) = wb[0];
            let (tb1, pb1) = wb[1];
            let len_b = pb0.distance_to(&pb1);
            let (fs, ft) = segment_segment_closest(&pa0, &pa1, &pb0, &pb1);
            let gap = pa0.lerp(&pa1, fs).distance_to(&pb0.lerp(&pb1, ft));
            if gap > 0.5 * (len_a + len_b) + tol.coincidence {
                continue;
            }
            let s = ta0 + (ta1 - ta0) * fs;
            let t = tb0 + (tb1 - tb0) * ft;
            let (s, t, dist) = refine_curve_pair(a, b, s, t);
            if dist <= tol.coincidence {
                let point = a.evaluate(s).midpoint(&b.evaluate(t));
                hits.push(CurveCurveHit { point, t1: s, t2: t });
            }
        }
    }

    let mut hits = dedupe_by_point(hits, tol.coincidence * 10.0, |h| h.point);
    hits.sort_by(|x, y| x.t1.total_cmp(&y.t1));
    debug!(count = hits.len(), "generic curve-curve intersection");
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::curves::{Circle3d, Line3d};
    use crate::geometry::nurbs::NurbsCurve;

    #[test]
    fn test_segment_closest_crossing() {
        let (s, t) = segment_segment_closest(
            &Point3d::new(-1.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(0.0, -1.0, 1.0),
            &Point3d::new(0.0, 1.0, 1.0),
        );
        assert!((s - 0.5).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_generic_circle_circle_matches_analytic() {
        let c1 = Circle3d::new(Point3d::ORIGIN, Vec3::Z, 1.0);
        let c2 = Circle3d::new(Point3d::new(1.5, 0.0, 0.0), Vec3::Z, 1.0);
        let hits = curve_curve(&c1, &c2, &Tolerance::default());
        assert_eq!(hits.len(), 2);
        for h in &hits {
            assert!((h.point.x - 0.75).abs() < 1e-6);
        }
    }

    #[test]
    fn test_line_through_nurbs_arch() {
        let arch = NurbsCurve::bspline(
            2,
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(5.0, 10.0, 0.0),
                Point3d::new(10.0, 0.0, 0.0),
            ],
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        )
        .unwrap();
        let line = Line3d::new(Point3d::new(-1.0, 2.0, 0.0), Point3d::new(11.0, 2.0, 0.0));
        let hits = curve_curve(&arch, &line, &Tolerance::default());
        assert_eq!(hits.len(), 2);
        for h in &hits {
            assert!((h.point.y - 2.0).abs() < 1e-6);
        }
        assert!(hits[0].t1 < hits[1].t1);
    }

    #[test]
    fn test_disjoint_curves_have_no_hits() {
        let c1 = Circle3d::new(Point3d::ORIGIN, Vec3::Z, 1.0);
        let c2 = Circle3d::new(Point3d::new(0.0, 0.0, 1.0), Vec3::Z, 1.0);
        assert!(curve_curve(&c1, &c2, &Tolerance::default()).is_empty());
    }
}
