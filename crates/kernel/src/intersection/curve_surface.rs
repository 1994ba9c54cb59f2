//! Curve against plane and curve against parametric surface.

use tracing::debug;

use crate::Tolerance;
use crate::error::KernelError;
use crate::geometry::curves::{Curve, Polyline};
use crate::geometry::surfaces::Plane;
use crate::traits::{ParametricCurve, ParametricSurface};

use super::{CurveIntersection, CurveSurfaceHit, bisect, dedupe_by_point};

const SAMPLES: usize = 256;

/// Parameters in `[t0, t1]` where `f` crosses zero, found by sampling for
/// sign changes and bisecting each bracket. Samples already within `zero_tol`
/// of zero count as roots (tangential touches never change sign).
fn sampled_roots(
    f: impl Fn(f64) -> f64, (t0,
    t1): (f64,
    f64), zero_tol: f64, param_tol: f64,
) -> Vec<f64> {
    let n = SAMPLES;
    let ts: Vec<f64> = (0..=n).map(|i| t0 + (t1 - t0) * (i as f64 / n as f64)).collect();
    let vals: Vec<f64> = ts.iter().map(|&t| f(t)).collect();
    let mut roots = Vec::new();
    for i in 0..n {
        let (fa, fb) = (vals[i], vals[i + 1]);
        if fa.abs() <= zero_tol {
            roots.push(ts[i]);
        } else if fb.abs() > zero_tol && (fa < 0.0) != (fb < 0.0) {
            roots.push(bisect(&f, ts[i], ts[i + 1], fa, param_tol));
        }
    }
    if vals[n].abs() <= zero_tol {
        roots.push(ts[n]);
    }
    roots
}

/// A curve that sits inside the other operand, as an overlap curve value.
pub fn overlap_copy<C: ParametricCurve + ?Sized>(curve: &C) -> Curve {
    Curve::Polyline(Polyline::new(curve.sample(SAMPLES + 1).into_iter().map(|(_, p)| p).collect()))
}

/// Intersect any curve with a plane. A curve lying entirely in the plane is
/// reported as an overlap (a dense polyline copy of the curve).
pub fn curve_plane<C: ParametricCurve + ?Sized>(
    curve: &C,
    plane: &Plane,
    tol: &Tolerance,
) -> Result<CurveIntersection<CurveSurfaceHit>, KernelError> {
    if plane.normal.normalized().is_none() {
        return Err(KernelError::degenerate("plane normal is zero"));
    }
    let dist = |t: f64| plane.distance_to_point(&curve.evaluate(t));

    if curve
        .sample(SAMPLES + 1)
        .iter()
        .all(|(_, p)| plane.distance_to_point(p).abs() <= tol.coincidence)
    {
        return Ok(CurveIntersection {
            hits: Vec::new(),
            overlaps: vec![overlap_copy(curve)],
        });
    }

    let roots = sampled_roots(dist, curve.domain(), tol.coincidence, tol.parametric);
    let hits: Vec<CurveSurfaceHit> = roots
        .into_iter()
        .filter_map(|t| {
            let point = curve.evaluate(t);
            if plane.distance_to_point(&point).abs() > tol.coincidence {
                return None;
            }
            let (u, v) = plane.parameters_of(&point);
            Some(CurveSurfaceHit { point, t, u, v })
        })
        .collect();
    let hits = dedupe_by_point(hits, tol.coincidence * 10.0, |h| h.point);
    debug!(count = hits.len(), "curve-plane intersection");
    Ok(CurveIntersection::from_hits(hits))
}

/// Intersect any curve with a bounded parametric surface.
///
/// The signed distance `(C(t) - S*) . n(S*)`, with `S*` the surface point
/// nearest `C(t)`, is root-bracketed along the curve; each root is kept only
/// if it really lies on the surface.
pub fn curve_surface<C, S>(curve: &C, surface: &S, tol: &Tolerance) -> Vec<CurveSurfaceHit>
where
    C: ParametricCurve + ?Sized,
    S: ParametricSurface + ?Sized,
{
    let signed = |t: f64| {
        let p = curve.evaluate(t);
        let (u, v, q) = surface.closest_point(&p);
        (p - q).dot(&surface.normal_at(u, v))
    };

    let roots = sampled_roots(signed, curve.domain(), tol.coincidence, tol.parametric);
    let hits: Vec<CurveSurfaceHit> = roots
        .into_iter()
        .filter_map(|t| {
            let p = curve.evaluate(t);
            let (u, v, q) = surface.closest_point(&p);
            (p.distance_to(&q) <= tol.coincidence).then(|| CurveSurfaceHit {
                point: p.midpoint(&q),
                t,
                u,
                v,
            })
        })
        .collect();
    let hits = dedupe_by_point(hits, tol.coincidence * 10.0, |h| h.point);
    debug!(count = hits.len(), "curve-surface intersection");
    hits
}
