//! Capability traits shared by every curve and surface representation.
//!
//! The generic intersection, near-miss and perturbation code only ever talks
//! to geometry through these two traits, so a caller-defined curve type gets
//! all of it by implementing [`ParametricCurve`].

use std::fmt;
use std::sync::Arc;

use nalgebra::{Matrix2, Vector2};

use crate::geometry::bbox::BoundingBox;
use crate::geometry::point::Point3d;
use crate::geometry::vector::Vec3;

/// Samples used by the default length and bounding-box estimates.
const CURVE_ESTIMATE_SAMPLES: usize = 256;
/// Seed samples for the default curve closest-point search.
const CLOSEST_SEED_SAMPLES: usize = 64;
/// Seed grid (per direction) for the default surface closest-point search.
const SURFACE_SEED_GRID: usize = 16;
const NEWTON_ITERATIONS: usize = 32;

/// A curve evaluable over a closed, bounded parameter interval.
pub trait ParametricCurve: fmt::Debug + Send + Sync {
    /// Parameter interval `[t0, t1]`, `t0 < t1`.
    fn domain(&self) -> (f64, f64);

    fn evaluate(&self, t: f64) -> Point3d;

    fn derivative(&self, t: f64) -> Vec3;

    /// Second derivative; central differences of [`derivative`](Self::derivative) by default.
    fn second_derivative(&self, t: f64) -> Vec3 {
        let (t0, t1) = self.domain();
        let h = ((t1 - t0).abs() * 1e-6).max(1e-9);
        let a = (t - h).max(t0);
        let b = (t + h).min(t1);
        if b - a < 1e-15 {
            return Vec3::ZERO;
        }
        (self.derivative(b) - self.derivative(a)) / (b - a)
    }

    /// Unit tangent, `None` where the derivative vanishes or is not finite.
    fn tangent(&self, t: f64) -> Option<Vec3> {
        self.derivative(t).normalized()
    }

    fn is_closed(&self) -> bool {
        let (t0, t1) = self.domain();
        self.evaluate(t0).distance_to(&self.evaluate(t1)) < 1e-9
    }

    /// Arc length estimate.
    fn length(&self) -> f64 {
        polyline_length(&self.sample(CURVE_ESTIMATE_SAMPLES))
    }

    /// `count` evenly spaced `(t, point)` samples including both ends (at least two).
    fn sample(&self, count: usize) -> Vec<(f64, Point3d)> {
        let n = count.max(2);
        let (t0, t1) = self.domain();
        (0..n)
            .map(|i| {
                let t = t0 + (t1 - t0) * (i as f64 / (n - 1) as f64);
                (t, self.evaluate(t))
            })
            .collect()
    }

    /// Parameter and location of the point on the curve nearest to `p`.
    fn closest_point(&self, p: &Point3d) -> (f64, Point3d) {
        closest_point_on_curve(self, p)
    }

    fn bounding_box(&self) -> BoundingBox {
        let samples = self.sample(CURVE_ESTIMATE_SAMPLES);
        BoundingBox::from_points(samples.iter().map(|(_, p)| p))
    }
}

/// A surface evaluable over a bounded rectangular `(u, v)` domain.
pub trait ParametricSurface: fmt::Debug + Send + Sync {
    fn domain_u(&self) -> (f64, f64);

    fn domain_v(&self) -> (f64, f64);

    fn evaluate(&self, u: f64, v: f64) -> Point3d;

    /// Unit normal at `(u, v)`.
    fn normal_at(&self, u: f64, v: f64) -> Vec3;

    /// First partial derivatives `(dS/du, dS/dv)`; central differences by default.
    fn partials(&self, u: f64, v: f64) -> (Vec3, Vec3) {
        let (u0, u1) = self.domain_u();
        let (v0, v1) = self.domain_v();
        let hu = ((u1 - u0).abs() * 1e-6).max(1e-9);
        let hv = ((v1 - v0).abs() * 1e-6).max(1e-9);
        let (ua, ub) = ((u - hu).max(u0), (u + hu).min(u1));
        let (va, vb) = ((v - hv).max(v0), (v + hv).min(v1));
        let su = if ub - ua > 1e-15 {
            (self.evaluate(ub, v) - self.evaluate(ua, v)) / (ub - ua)
        } else {
            Vec3::ZERO
        };
        let sv = if vb - va > 1e-15 {
            (self.evaluate(u, vb) - self.evaluate(u, va)) / (vb - va)
        } else {
            Vec3::ZERO
        };
        (su, sv)
    }

    /// `(u, v)` and location of the point on the surface nearest to `p`.
    fn closest_point(&self, p: &Point3d) -> (f64, f64, Point3d) {
        closest_point_on_surface(self, p)
    }

    fn bounding_box(&self) -> BoundingBox {
        let grid = sample_grid(self, 24);
        BoundingBox::from_points(grid.iter().map(|(_, _, p)| p))
    }
}

/// Total length of the polyline through the sampled points.
pub fn polyline_length(samples: &[(f64, Point3d)]) -> f64 {
    samples
        .windows(2)
        .map(|w| w[0].1.distance_to(&w[1].1))
        .sum()
}

/// `n x n` grid of `(u, v, point)` samples spanning the surface domain.
pub fn sample_grid<S: ParametricSurface + ?Sized>(
    surface: &S,
    n: usize,
) -> Vec<(f64, f64, Point3d)> {
    let n = n.max(2);
    let (u0, u1) = surface.domain_u();
    let (v0, v1) = surface.domain_v();
    let mut out = Vec::with_capacity(n * n);
    for i in 0..n {
        let u = u0 + (u1 - u0) * (i as f64 / (n - 1) as f64);
        for j in 0..n {
            let v = v0 + (v1 - v0) * (j as f64 / (n - 1) as f64);
            out.push((u, v, surface.evaluate(u, v)));
        }
    }
    out
}

/// Sampled seed followed by Newton iteration on `(C(t) - p) . C'(t) = 0`.
pub fn closest_point_on_curve<C: ParametricCurve + ?Sized>(
    curve: &C,
    p: &Point3d) -> (f64, Point3d,
) {
    let (t0, t1) = curve.domain();
    let mut best_t = t0;
    let mut best_d = f64::INFINITY;
    for (t, q) in curve.sample(CLOSEST_SEED_SAMPLES) {
        let d = q.distance_squared_to(p);
        if d < best_d {
            best_d = d;
            best_t = t;
        }
    }

    let mut t = best_t;
    for _ in 0..NEWTON_ITERATIONS {
        let c = curve.evaluate(t);
        let d1 = curve.derivative(t);
        let d2 = curve.second_derivative(t);
        let r = c - *p;
        let f = r.dot(&d1);
        let df = d1.dot(&d1) + r.dot(&d2);
        if df.abs() < 1e-300 || !df.is_finite() {
            break;
        }
        let next = (t - f / df).clamp(t0, t1);
        let step = (next - t).abs();
        t = next;
        if step < 1e-15 * (1.0 + t.abs()) {
            break;
        }
    }

    let refined = curve.evaluate(t);
    if refined.distance_squared_to(p) <= best_d {
        (t, refined)
    } else {
        (best_t, curve.evaluate(best_t))
    }
}

/// Grid seed followed by Gauss-Newton on `|S(u, v) - p|^2`.
pub fn closest_point_on_surface<S: ParametricSurface + ?Sized>(
    surface: &S,
    p: &Point3d,
) -> (f64, f64, Point3d) {
    let (u0, u1) = surface.domain_u();
    let (v0, v1) = surface.domain_v();

    let mut best = (u0, v0);
    let mut best_d = f64::INFINITY;
    for (u, v, q) in sample_grid(surface, SURFACE_SEED_GRID) {
        let d = q.distance_squared_to(p);
        if d < best_d {
            best_d = d;
            best = (u, v);
        }
    }

    let (mut u, mut v) = best;
    for _ in 0..NEWTON_ITERATIONS {
        let r = surface.evaluate(u, v) - *p;
        let (su, sv) = surface.partials(u, v);
        let jtj = Matrix2::new(su.dot(&su), su.dot(&sv), sv.dot(&su), sv.dot(&sv));
        let jtr = Vector2::new(su.dot(&r), sv.dot(&r));
        let Some(inv) = jtj.try_inverse() else {
            break;
        };
        let delta = inv * jtr;
        let nu = (u - delta[0]).clamp(u0, u1);
        let nv = (v - delta[1]).clamp(v0, v1);
        let step = (nu - u).abs() + (nv - v).abs();
        u = nu;
        v = nv;
        if !step.is_finite() || step < 1e-15 {
            break;
        }
    }

    let refined = surface.evaluate(u, v);
    if refined.distance_squared_to(p) <= best_d {
        (u, v, refined)
    } else {
        (best.0, best.1, surface.evaluate(best.0, best.1))
    }
}

/// A rigidly translated view of another curve.
///
/// Used to build perturbed copies of curves whose concrete type is opaque to
/// the kernel (caller-defined curves behind `Arc<dyn ParametricCurve>`).
#[derive(Debug, Clone)]
pub struct TranslatedCurve {
    inner: Arc<dyn ParametricCurve>,
    offset: Vec3,
}

impl TranslatedCurve {
    pub fn new(inner: Arc<dyn ParametricCurve>, offset: Vec3) -> Self {
        Self { inner, offset }
    }
}

impl ParametricCurve for TranslatedCurve {
    fn domain(&self) -> (f64, f64) {
        self.inner.domain()
    }

    fn evaluate(&self, t: f64) -> Point3d {
        self.inner.evaluate(t) + self.offset
    }

    fn derivative(&self, t: f64) -> Vec3 {
        self.inner.derivative(t)
    }

    fn second_derivative(&self, t: f64) -> Vec3 {
        self.inner.second_derivative(t)
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn length(&self) -> f64 {
        self.inner.length()
    }

    fn closest_point(&self, p: &Point3d) -> (f64, Point3d) {
        let (t, q) = self.inner.closest_point(&(*p - self.offset));
        (t, q + self.offset)
    }

    fn bounding_box(&self) -> BoundingBox {
        self.inner.bounding_box().translated(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Helix segment; exercises every default method.
    #[derive(Debug)]
    struct Helix;

    impl ParametricCurve for Helix {
        fn domain(&self) -> (f64, f64) {
            (0.0, 2.0 * PI)
        }
        fn evaluate(&self, t: f64) -> Point3d {
            Point3d::new(t.cos(), t.sin(), 0.1 * t)
        }
        fn derivative(&self, t: f64) -> Vec3 {
            Vec3::new(-t.sin(), t.cos(), 0.1)
        }
    }

    #[test]
    fn test_default_closest_point_converges() {
        let helix = Helix;
        let radial = Vec3::new(1.3f64.cos(), 1.3f64.sin(), 0.0);
        let target = helix.evaluate(1.3) + radial * 0.05;
        let (t, q) = helix.closest_point(&target);
        assert!((t - 1.3).abs() < 1e-3, "t={t}");
        assert!(q.distance_to(&target) < 0.06);
    }

    #[test]
    fn test_default_length_of_helix() {
        let expected = 2.0 * PI * (1.0f64 + 0.01).sqrt();
        assert!((Helix.length() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_helix_is_open() {
        assert!(!Helix.is_closed());
    }

    #[test]
    fn test_translated_curve_shifts_everything() {
        let base: Arc<dyn ParametricCurve> = Arc::new(Helix);
        let moved = TranslatedCurve::new(base.clone(), Vec3::new(0.0, 0.0, 5.0));
        let p = moved.evaluate(0.0);
        assert!((p.z - 5.0).abs() < 1e-12);
        let (t, q) = moved.closest_point(&Point3d::new(1.0, 0.0, 5.0));
        assert!(t.abs() < 1e-6);
        assert!(q.distance_to(&Point3d::new(1.0, 0.0, 5.0)) < 1e-6);
        assert!((moved.bounding_box().min.z - (base.bounding_box().min.z + 5.0)).abs() < 1e-12);
    }
}
