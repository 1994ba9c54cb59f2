//! Native intersection numerics, one family per submodule.
//!
//! "No intersection" is an empty hit list. An `Err` means the routine could
//! not decide, e.g. coincident surfaces whose intersection is not a finite
//! set of points or curves.

pub mod analytic;
pub mod curve_curve;
pub mod curve_surface;
pub mod mesh;
pub mod surface_surface;

use serde::{Deserialize, Serialize};

use crate::geometry::curves::Curve;
use crate::geometry::point::Point3d;

/// Point where two curves meet, with the parameter on each.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveCurveHit {
    pub point: Point3d,
    pub t1: f64,
    pub t2: f64,
}

/// Point where a curve meets a surface (or plane).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSurfaceHit {
    pub point: Point3d,
    pub t: f64,
    pub u: f64,
    pub v: f64,
}

/// Point on the intersection of two surfaces, with `(u, v)` on each.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSurfaceHit {
    pub point: Point3d,
    pub uv1: (f64, f64),
    pub uv2: (f64, f64),
}

/// Ray hit; `face` is the source face for tessellated targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    pub point: Point3d,
    pub t: f64,
    pub u: f64,
    pub v: f64,
    pub face: Option<usize>,
}

/// Discrete hits plus any overlap curves where the operands coincide.
#[derive(Debug, Clone, Default)]
pub struct CurveIntersection<H> {
    pub hits: Vec<H>,
    pub overlaps: Vec<Curve>,
}

impl<H> CurveIntersection<H> {
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            overlaps: Vec::new(),
        }
    }

    pub fn from_hits(hits: Vec<H>) -> Self {
        Self {
            hits,
            overlaps: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty() && self.overlaps.is_empty()
    }
}

/// Result of intersecting two analytic surfaces.
#[derive(Debug, Clone)]
pub enum SurfaceIntersection {
    None,
    /// Tangent contact at a single point.
    Point(Point3d),
    Curve(Curve),
    /// Identical geometric locus.
    Coincident,
}

/// Drop hits closer than `min_gap` to an earlier one, keeping the first.
pub(crate) fn dedupe_by_point<H>(
    hits: Vec<H>,
    min_gap: f64,
    point: impl Fn(&H) -> Point3d,
) -> Vec<H> {
    let mut out: Vec<H> = Vec::with_capacity(hits.len());
    for h in hits {
        let p = point(&h);
        if out.iter().all(|o| point(o).distance_to(&p) > min_gap) {
            out.push(h);
        }
    }
    out
}

/// Bisection for a root of `f` on `[a, b]` given `f(a)` and `f(b)` of opposite sign.
pub(crate) fn bisect(f: impl Fn(f64) -> f64, mut a: f64, mut b: f64, mut fa: f64, tol: f64) -> f64 {
    for _ in 0..100 {
        let m = 0.5 * (a + b);
        let fm = f(m);
        if fm == 0.0 || (b - a).abs() < tol {
            return m;
        }
        if (fa < 0.0) == (fm < 0.0) {
            a = m;
            fa = fm;
        } else {
            b = m;
        }
    }
    0.5 * (a + b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bisect_finds_sqrt_two() {
        let f = |x: f64| x * x - 2.0;
        let r = bisect(f, 0.0, 2.0, f(0.0), 1e-14);
        assert!((r - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let pts = vec![
            Point3d::ORIGIN,
            Point3d::new(1e-9, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
        ];
        let out = dedupe_by_point(pts, 1e-6, |p| *p);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Point3d::ORIGIN);
    }
}
