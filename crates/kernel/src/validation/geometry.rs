//! Curve and surface health: degeneracy, NURBS data, parameter domains and
//! finite coordinates.

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::Tolerance;
use crate::geometry::curves::{Curve, Ray};
use crate::geometry::point::Point3d;
use crate::geometry::surfaces::{Plane, Surface};
use crate::geometry::vector::Vec3;
use crate::traits::{ParametricCurve, ParametricSurface};

use super::types::{ErrorCode, Finding};

fn radius_check(what: &str, radius: f64, tol: &Tolerance, out: &mut Vec<Finding>) {
    if !(radius > tol.coincidence) {
        out.push(Finding::measured(
            ErrorCode::ZeroRadius,
            format!("{what} radius is not above tolerance"),
            radius,
            tol.coincidence,
        ));
    }
}

fn direction_check(what: &str, v: &Vec3, out: &mut Vec<Finding>) {
    if v.normalized().is_none() {
        out.push(Finding::new(ErrorCode::ZeroDirection, format!("{what} has zero length")));
    }
}

fn length_check<C: ParametricCurve + ?Sized>(curve: &C, tol: &Tolerance, out: &mut Vec<Finding>) {
    let len = curve.length();
    if !(len > tol.coincidence) {
        out.push(Finding::measured(
            ErrorCode::ZeroLengthCurve,
            "curve length is not above tolerance",
            len,
            tol.coincidence,
        ));
    }
}

/// Degenerate-shape checks for the built-in curve types.
pub fn curve_degeneracy(curve: &Curve, tol: &Tolerance) -> Vec<Finding> {
    let mut out = Vec::new();
    match curve {
        Curve::Line(_) | Curve::Nurbs(_) => length_check(curve, tol, &mut out),
        Curve::Circle(c) => {
            radius_check("circle", c.radius, tol, &mut out);
            direction_check("circle normal", &c.normal, &mut out);
        }
        Curve::Arc(a) => {
            radius_check("arc", a.circle.radius, tol, &mut out);
            let sweep = a.sweep();
            if !(sweep > tol.angular && sweep <= TAU + tol.angular) {
                out.push(Finding::measured(
                    ErrorCode::InvalidSweep,
                    "arc sweep must lie in (0, 2*PI]",
                    sweep,
                    tol.angular,
                ));
            }
        }
        Curve::Ellipse(e) => {
            radius_check("ellipse major", e.major_radius, tol, &mut out);
            radius_check("ellipse minor", e.minor_radius, tol, &mut out);
        }
        Curve::Polyline(p) => {
            if p.points.len() < 2 {
                out.push(Finding::new(
                    ErrorCode::ZeroLengthCurve,
                    "polyline needs at least two points",
                ));
            } else {
                length_check(curve, tol, &mut out);
            }
        }
    }
    out
}

/// Length check for curves known only through [`ParametricCurve`].
pub fn generic_curve_degeneracy<C: ParametricCurve + ?Sized>(
    curve: &C,
    tol: &Tolerance,
) -> Vec<Finding> {
    let mut out = Vec::new();
    length_check(curve, tol, &mut out);
    out
}

pub fn plane_degeneracy(plane: &Plane) -> Vec<Finding> {
    let mut out = Vec::new();
    direction_check("plane normal", &plane.normal, &mut out);
    out
}

pub fn ray_degeneracy(ray: &Ray) -> Vec<Finding> {
    let mut out = Vec::new();
    direction_check("ray direction", &ray.direction, &mut out);
    out
}

pub fn surface_degeneracy(surface: &Surface, tol: &Tolerance) -> Vec<Finding> {
    let mut out = Vec::new();
    let height_check = |h: f64, out: &mut Vec<Finding>| {
        if !(h > tol.coincidence) {
            out.push(Finding::measured(
                ErrorCode::ZeroHeight,
                "height is not above tolerance",
                h,
                tol.coincidence,
            ));
        }
    };
    match surface {
        Surface::Sphere(s) => radius_check("sphere", s.radius, tol, &mut out),
        Surface::Cylinder(c) => {
            radius_check("cylinder", c.radius, tol, &mut out);
            direction_check("cylinder axis", &c.axis, &mut out);
            height_check(c.height, &mut out);
        }
        Surface::Cone(c) => {
            direction_check("cone axis", &c.axis, &mut out);
            height_check(c.height, &mut out);
            if !(c.half_angle > tol.angular && c.half_angle < FRAC_PI_2 - tol.angular) {
                out.push(Finding::measured(
                    ErrorCode::InvalidSweep,
                    "cone half angle must lie in (0, PI/2)",
                    c.half_angle,
                    tol.angular,
                ));
            }
        }
        Surface::Torus(t) => {
            radius_check("torus major", t.major_radius, tol, &mut out);
            radius_check("torus minor", t.minor_radius, tol, &mut out);
            direction_check("torus axis", &t.axis, &mut out);
        }
    }
    out
}

/// Structural NURBS checks; other curve types pass.
pub fn nurbs_geometry(curve: &Curve) -> Vec<Finding> {
    match curve {
        Curve::Nurbs(n) => match n.check() {
            Ok(()) => Vec::new(),
            Err(e) => vec![Finding::new(ErrorCode::InvalidNurbsData, e.to_string())],
        },
        _ => Vec::new(),
    }
}

fn interval_check(name: &str, (a, b): (f64, f64), out: &mut Vec<Finding>) {
    if !(a.is_finite() && b.is_finite() && b > a) {
        out.push(Finding::new(
            ErrorCode::InvalidDomain,
            format!("{name} domain [{a}, {b}] is empty or not finite"),
        ));
    }
}

pub fn curve_domain<C: ParametricCurve + ?Sized>(curve: &C) -> Vec<Finding> {
    let mut out = Vec::new();
    interval_check("curve", curve.domain(), &mut out);
    out
}

pub fn surface_domain<S: ParametricSurface + ?Sized>(surface: &S) -> Vec<Finding> {
    let mut out = Vec::new();
    interval_check("u", surface.domain_u(), &mut out);
    interval_check("v", surface.domain_v(), &mut out);
    out
}

/// At most one finding: the first non-finite point.
pub fn finite_points<'a>(points: impl IntoIterator<Item = &'a Point3d>) -> Vec<Finding> {
    points
        .into_iter()
        .position(|p| !p.is_finite())
        .map(|i| {
            vec![Finding::new(
                ErrorCode::NonFiniteCoordinate,
                format!("point {i} is not finite"),
            )]
        })
        .unwrap_or_default()
}
