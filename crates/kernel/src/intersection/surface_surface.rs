//! Surface-plane and surface-surface intersection by grid-edge root finding.
//!
//! The first surface is sampled on a regular `(u, v)` grid; every grid edge
//! across which the signed distance to the other operand changes sign is
//! bisected to a point on the intersection. The result is a point trace of
//! the intersection curves, ordered along `u` then `v`.

use tracing::debug;

use crate::Tolerance;
use crate::error::KernelError;
use crate::geometry::surfaces::Plane;
use crate::traits::ParametricSurface;

use super::{SurfaceSurfaceHit, bisect, dedupe_by_point};

const GRID: usize = 48;

fn grid_axis((a, b): (f64, f64)) -> Vec<f64> {
    (0..=GRID).map(|i| a + (b - a) * (i as f64 / GRID as f64)).collect()
}

/// Root points of `f(u, v)` along the edges of the grid over `surface`.
fn trace_zero_set<S, F>(surface: &S, f: F, tol: &Tolerance) -> Vec<(f64, f64)>
where
    S: ParametricSurface + ?Sized,
    F: Fn(f64, f64) -> f64,
{
    let us = grid_axis(surface.domain_u());
    let vs = grid_axis(surface.domain_v());
    let vals: Vec<Vec<f64>> = us.iter().map(|&u| vs.iter().map(|&v| f(u, v)).collect()).collect();
    let crosses = |a: f64, b: f64| {
        a.abs() > tol.coincidence && b.abs() > tol.coincidence && (a < 0.0) != (b < 0.0)
    };

    let mut out = Vec::new();
    for i in 0..=GRID {
        for j in 0..=GRID {
            let fa = vals[i][j];
            if fa.abs() <= tol.coincidence {
                out.push((us[i], vs[j]));
                continue;
            }
            if i < GRID && crosses(fa, vals[i + 1][j]) {
                let v = vs[j];
                let u = bisect(|u| f(u, v), us[i], us[i + 1], fa, tol.parametric);
                out.push((u, v));
            }
            if j < GRID && crosses(fa, vals[i][j + 1]) {
                let u = us[i];
                let v = bisect(|v| f(u, v), vs[j], vs[j + 1], fa, tol.parametric);
                out.push((u, v));
            }
        }
    }
    out
}

/// Sampled intersection of a bounded surface with a plane.
pub fn surface_plane<S: ParametricSurface + ?Sized>(
    surface: &S,
    plane: &Plane,
    tol: &Tolerance,
) -> Result<Vec<SurfaceSurfaceHit>, KernelError> {
    if plane.normal.normalized().is_none() {
        return Err(KernelError::degenerate("plane normal is zero"));
    }
    let f = |u: f64, v: f64| plane.distance_to_point(&surface.evaluate(u, v));
    let hits: Vec<SurfaceSurfaceHit> = trace_zero_set(surface, f, tol)
        .into_iter()
        .filter_map(|(u, v)| {
            let point = surface.evaluate(u, v);
            (plane.distance_to_point(&point).abs() <= tol.coincidence).then(|| SurfaceSurfaceHit {
                point,
                uv1: (u, v),
                uv2: plane.parameters_of(&point),
            })
        })
        .collect();
    let hits = dedupe_by_point(hits, tol.coincidence * 10.0, |h| h.point);
    debug!(count = hits.len(), "surface-plane intersection");
    Ok(hits)
}

/// Sampled intersection of two bounded surfaces.
pub fn surface_surface<A, B>(a: &A, b: &B, tol: &Tolerance) -> Vec<SurfaceSurfaceHit>
where
    A: ParametricSurface + ?Sized,
    B: ParametricSurface + ?Sized,
{
    if !a.bounding_box().expanded(tol.coincidence).intersects(&b.bounding_box()) {
        return Vec::new();
    }
    let signed = |u: f64, v: f64| {
        let p = a.evaluate(u, v);
        let (ub, vb, q) = b.closest_point(&p);
        (p - q).dot(&b.normal_at(ub, vb))
    };
    let hits: Vec<SurfaceSurfaceHit> = trace_zero_set(a, signed, tol)
        .into_iter()
        .filter_map(|(u, v)| {
            let p = a.evaluate(u, v);
            let (ub, vb, q) = b.closest_point(&p);
            (p.distance_to(&q) <= tol.coincidence).then(|| SurfaceSurfaceHit {
                point: p.midpoint(&q),
                uv1: (u, v),
                uv2: (ub, vb),
            })
        })
        .collect();
    let hits = dedupe_by_point(hits, tol.coincidence * 10.0, |h| h.point);
    debug!(count = hits.len(), "surface-surface intersection");
    hits
}
