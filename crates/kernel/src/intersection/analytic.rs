//! Closed-form intersections between lines, circles, planes, spheres and
//! cylinders.

use std::f64::consts::TAU;

use crate::Tolerance;
use crate::error::KernelError;
use crate::geometry::curves::{Circle3d, Curve, Line3d, Ray};
use crate::geometry::point::Point3d;
use crate::geometry::surfaces::{Cylinder, Plane, Sphere};
use crate::geometry::vector::Vec3;
use crate::traits::{ParametricCurve, ParametricSurface};

use super::{CurveCurveHit, CurveIntersection, CurveSurfaceHit, RayHit, SurfaceIntersection};

const PARALLEL_EPS: f64 = 1e-12;

// ─── Line-Line ───────────────────────────────────────────────────────────────

/// Intersect two line segments.
///
/// Crossing segments give one hit at the midpoint of the closest-point pair.
/// Collinear segments give their shared stretch as an overlap, or a single
/// hit when they only touch end to end.
pub fn line_line(
    l1: &Line3d,
    l2: &Line3d,
    tol: &Tolerance,
) -> Result<CurveIntersection<CurveCurveHit>, KernelError> {
    let d1 = l1.direction();
    let d2 = l2.direction();
    let (a, c) = (d1.length_squared(), d2.length_squared());
    if tol.is_zero_length(a.sqrt()) || tol.is_zero_length(c.sqrt()) {
        return Err(KernelError::degenerate("zero-length line segment"));
    }
    let (len1, len2) = (a.sqrt(), c.sqrt());
    let w = l1.start - l2.start;
    let b = d1.dot(&d2);
    let denom = a * c - b * b;

    if denom > PARALLEL_EPS * a * c {
        let d = d1.dot(&w);
        let e = d2.dot(&w);
        let t1 = (b * e - c * d) / denom;
        let t2 = (a * e - b * d) / denom;
        let slack1 = tol.coincidence / len1;
        let slack2 = tol.coincidence / len2;
        if t1 < -slack1 || t1 > 1.0 + slack1 || t2 < -slack2 || t2 > 1.0 + slack2 {
            return Ok(CurveIntersection::empty());
        }
        let (t1, t2) = (t1.clamp(0.0, 1.0), t2.clamp(0.0, 1.0));
        let (p1, p2) = (l1.evaluate(t1), l2.evaluate(t2));
        if p1.distance_to(&p2) > tol.coincidence {
            return Ok(CurveIntersection::empty());
        }
        return Ok(CurveIntersection::from_hits(vec![CurveCurveHit {
            point: p1.midpoint(&p2),
            t1,
            t2,
        }]));
    }

    // Parallel: only collinear segments can meet.
    let offset = w.cross(&d1).length() / len1;
    if offset > tol.coincidence {
        return Ok(CurveIntersection::empty());
    }
    let s_a = (l2.start - l1.start).dot(&d1) / a;
    let s_b = (l2.end - l1.start).dot(&d1) / a;
    let lo = s_a.min(s_b).max(0.0);
    let hi = s_a.max(s_b).min(1.0);
    if lo > hi + tol.coincidence / len1 {
        return Ok(CurveIntersection::empty());
    }
    let hi = hi.max(lo);
    let (p_lo, p_hi) = (l1.evaluate(lo), l1.evaluate(hi));
    if p_lo.distance_to(&p_hi) <= tol.coincidence {
        let (t2, _) = l2.closest_point(&p_lo);
        return Ok(CurveIntersection::from_hits(vec![CurveCurveHit {
            point: p_lo,
            t1: lo,
            t2,
        }]));
    }
    Ok(CurveIntersection {
        hits: Vec::new(),
        overlaps: vec![Curve::Line(Line3d::new(p_lo, p_hi))],
    })
}

// ─── Circle-Circle ───────────────────────────────────────────────────────────

/// Parameters where `circle` crosses `plane`. Empty when the circle lies in a
/// plane parallel to `plane`.
pub fn circle_plane_parameters(circle: &Circle3d, plane: &Plane, tol: &Tolerance) -> Vec<f64> {
    let a = circle.radius * circle.x_axis.dot(&plane.normal);
    let b = circle.radius * circle.y_axis().dot(&plane.normal);
    let c = plane.distance_to_point(&circle.center);
    let r = a.hypot(b);
    if r < PARALLEL_EPS || c.abs() > r + tol.coincidence {
        return Vec::new();
    }
    let phi = b.atan2(a);
    let delta = (-c / r).clamp(-1.0, 1.0).acos();
    if delta * r <= tol.coincidence {
        return vec![phi.rem_euclid(TAU)];
    }
    let mut ts = vec![(phi - delta).rem_euclid(TAU), (phi + delta).rem_euclid(TAU)];
    ts.sort_by(f64::total_cmp);
    ts
}

/// Intersect two full circles.
///
/// Coplanar circles use the planar two-circle construction; coincident ones
/// report the whole circle as an overlap. Otherwise each circle's plane cuts
/// the other circle in at most two candidate points.
pub fn circle_circle(
    c1: &Circle3d,
    c2: &Circle3d,
    tol: &Tolerance,
) -> Result<CurveIntersection<CurveCurveHit>, KernelError> {
    if c1.radius <= tol.coincidence || c2.radius <= tol.coincidence {
        return Err(KernelError::degenerate("circle radius below tolerance"));
    }
    let plane1 = Plane::new(c1.center, c1.normal);
    let parallel = c1.normal.cross(&c2.normal).length() <= tol.angular.max(PARALLEL_EPS);

    if !parallel {
        let hits = circle_plane_parameters(c2, &plane1, tol)
            .into_iter()
            .filter_map(|t2| {
                let p = c2.evaluate(t2);
                let t1 = c1.parameter_of(&p);
                let q = c1.evaluate(t1);
                (p.distance_to(&q) <= tol.coincidence).then(|| CurveCurveHit {
                    point: p.midpoint(&q),
                    t1,
                    t2,
                })
            })
            .collect();
        return Ok(CurveIntersection::from_hits(hits));
    }

    if plane1.distance_to_point(&c2.center).abs() > tol.coincidence {
        return Ok(CurveIntersection::empty());
    }

    let v = c2.center - c1.center;
    let v = v - c1.normal * v.dot(&c1.normal);
    let d = v.length();
    let (r1, r2) = (c1.radius, c2.radius);

    if d <= tol.coincidence {
        if (r1 - r2).abs() <= tol.coincidence {
            return Ok(CurveIntersection {
                hits: Vec::new(),
                overlaps: vec![Curve::Circle(*c1)],
            });
        }
        return Ok(CurveIntersection::empty());
    }
    if d > r1 + r2 + tol.coincidence || d < (r1 - r2).abs() - tol.coincidence {
        return Ok(CurveIntersection::empty());
    }

    let dir = v / d;
    let a = (d * d + r1 * r1 - r2 * r2) / (2.0 * d);
    let h = (r1 * r1 - a * a).max(0.0).sqrt();
    let base = c1.center + dir * a;
    let perp = c1.normal.cross(&dir);

    let points = if h <= tol.coincidence {
        vec![base]
    } else {
        vec![base + perp * h, base - perp * h]
    };
    let hits = points
        .into_iter()
        .map(|p| CurveCurveHit {
            point: p,
            t1: c1.parameter_of(&p),
            t2: c2.parameter_of(&p),
        })
        .collect();
    Ok(CurveIntersection::from_hits(hits))
}

// ─── Line-Plane ──────────────────────────────────────────────────────────────

/// Intersect a segment with a plane. A segment lying in the plane is
/// returned whole as an overlap.
pub fn line_plane(
    line: &Line3d,
    plane: &Plane,
    tol: &Tolerance,
) -> Result<CurveIntersection<CurveSurfaceHit>, KernelError> {
    if plane.normal.normalized().is_none() {
        return Err(KernelError::degenerate("plane normal is zero"));
    }
    let dir = line.direction();
    let len = dir.length();
    if tol.is_zero_length(len) {
        return Err(KernelError::degenerate("zero-length line segment"));
    }
    let sd0 = plane.distance_to_point(&line.start);
    let denom = dir.dot(&plane.normal);

    if denom.abs() <= PARALLEL_EPS * len {
        if sd0.abs() <= tol.coincidence {
            return Ok(CurveIntersection {
                hits: Vec::new(),
                overlaps: vec![Curve::Line(*line)],
            });
        }
        return Ok(CurveIntersection::empty());
    }

    let t = -sd0 / denom;
    let slack = tol.coincidence / len;
    if t < -slack || t > 1.0 + slack {
        return Ok(CurveIntersection::empty());
    }
    let t = t.clamp(0.0, 1.0);
    let point = line.evaluate(t);
    let (u, v) = plane.parameters_of(&point);
    Ok(CurveIntersection::from_hits(vec![CurveSurfaceHit { point, t, u, v }]))
}

// ─── Plane-Sphere / Sphere-Sphere ────────────────────────────────────────────

/// Plane-sphere: nothing, a tangent point, or a circle in the plane.
pub fn plane_sphere(plane: &Plane, sphere: &Sphere, tol: &Tolerance) -> SurfaceIntersection {
    let signed_dist = plane.distance_to_point(&sphere.center);
    let dist = signed_dist.abs();

    if dist > sphere.radius + tol.coincidence {
        return SurfaceIntersection::None;
    }

    let center = sphere.center - plane.normal * signed_dist;
    if (dist - sphere.radius).abs() <= tol.coincidence {
        return SurfaceIntersection::Point(center);
    }

    let circle_radius = (sphere.radius * sphere.radius - dist * dist).max(0.0).sqrt();
    SurfaceIntersection::Curve(Curve::Circle(Circle3d::new(center, plane.normal, circle_radius)))
}

/// Sphere-sphere: nothing, a tangent point, a circle, or coincident.
pub fn sphere_sphere(s1: &Sphere, s2: &Sphere, tol: &Tolerance) -> SurfaceIntersection {
    let v = s2.center - s1.center;
    let d = v.length();
    let (r1, r2) = (s1.radius, s2.radius);

    if d <= tol.coincidence {
        return if (r1 - r2).abs() <= tol.coincidence {
            SurfaceIntersection::Coincident
        } else {
            SurfaceIntersection::None
        };
    }
    if d > r1 + r2 + tol.coincidence || d < (r1 - r2).abs() - tol.coincidence {
        return SurfaceIntersection::None;
    }

    let dir = v / d;
    let a = (d * d + r1 * r1 - r2 * r2) / (2.0 * d);
    let h = (r1 * r1 - a * a).max(0.0).sqrt();
    let center = s1.center + dir * a;
    if h <= tol.coincidence {
        return SurfaceIntersection::Point(center);
    }
    SurfaceIntersection::Curve(Curve::Circle(Circle3d::new(center, dir, h)))
}

// ─── Rays ────────────────────────────────────────────────────────────────────

pub fn ray_plane(ray: &Ray, plane: &Plane) -> Option<RayHit> {
    let denom = ray.direction.dot(&plane.normal);
    if denom.abs() < 1e-15 {
        return None;
    }
    let t = (plane.origin - ray.origin).dot(&plane.normal) / denom;
    if t < 0.0 {
        return None;
    }
    let point = ray.at(t);
    let (u, v) = plane.parameters_of(&point);
    Some(RayHit {
        point,
        t,
        u,
        v,
        face: None,
    })
}

/// Roots of `a t^2 + b t + c` with `t >= 0`, ascending.
fn forward_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 || a.abs() < 1e-15 {
        return Vec::new();
    }
    let s = disc.sqrt();
    let mut ts: Vec<f64> = [(-b - s) / (2.0 * a), (-b + s) / (2.0 * a)]
        .into_iter()
        .filter(|t| *t >= 0.0)
        .collect();
    ts.dedup_by(|x, y| (*x - *y).abs() < 1e-15);
    ts
}

pub fn ray_sphere(ray: &Ray, sphere: &Sphere) -> Vec<RayHit> {
    let oc = ray.origin - sphere.center;
    let a = ray.direction.dot(&ray.direction);
    let b = 2.0 * oc.dot(&ray.direction);
    let c = oc.dot(&oc) - sphere.radius * sphere.radius;
    forward_roots(a, b, c)
        .into_iter()
        .map(|t| {
            let point = ray.at(t);
            let (u, v) = sphere.parameters_of(&point);
            RayHit {
                point,
                t,
                u,
                v,
                face: None,
            }
        })
        .collect()
}

/// Ray against the lateral surface of a finite cylinder (no caps).
pub fn ray_cylinder(ray: &Ray, cyl: &Cylinder) -> Vec<RayHit> {
    let oc = ray.origin - cyl.origin;
    let d_proj: Vec3 = ray.direction - cyl.axis * ray.direction.dot(&cyl.axis);
    let oc_proj = oc - cyl.axis * oc.dot(&cyl.axis);

    let a = d_proj.dot(&d_proj);
    let b = 2.0 * d_proj.dot(&oc_proj);
    let c = oc_proj.dot(&oc_proj) - cyl.radius * cyl.radius;

    forward_roots(a, b, c)
        .into_iter()
        .filter_map(|t| {
            let point = ray.at(t);
            let (u, v, _) = cyl.closest_point(&point);
            let height = (point - cyl.origin).dot(&cyl.axis);
            (height >= 0.0 && height <= cyl.height).then_some(RayHit {
                point,
                t,
                u,
                v,
                face: None,
            })
        })
        .collect()
}
