use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::bbox::BoundingBox;
use super::nurbs::NurbsCurve;
use super::point::Point3d;
use super::vector::Vec3;
use crate::traits::ParametricCurve;

/// Concrete curve representations carried by the kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Curve {
    Line(Line3d),
    Circle(Circle3d),
    Arc(Arc3d),
    Ellipse(Ellipse3d),
    Polyline(Polyline),
    Nurbs(NurbsCurve),
}

/// A bounded line segment, parameterized over `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3d {
    pub start: Point3d,
    pub end: Point3d,
}

impl Line3d {
    pub fn new(start: Point3d, end: Point3d) -> Self {
        Self { start, end }
    }

    pub fn direction(&self) -> Vec3 {
        self.end - self.start
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }
}

impl ParametricCurve for Line3d {
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn evaluate(&self, t: f64) -> Point3d {
        self.start.lerp(&self.end, t)
    }

    fn derivative(&self, _t: f64) -> Vec3 {
        self.direction()
    }

    fn second_derivative(&self, _t: f64) -> Vec3 {
        Vec3::ZERO
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    fn closest_point(&self, p: &Point3d) -> (f64, Point3d) {
        let d = self.direction();
        let len2 = d.length_squared();
        if len2 < 1e-30 {
            return (0.0, self.start);
        }
        let t = ((*p - self.start).dot(&d) / len2).clamp(0.0, 1.0);
        (t, self.evaluate(t))
    }

    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points([&self.start, &self.end])
    }
}

/// A full circle in 3D space, parameterized by angle over `[0, 2*PI]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle3d {
    pub center: Point3d,
    pub normal: Vec3,
    pub radius: f64,
    /// Reference direction in the plane (angle zero).
    pub x_axis: Vec3,
}

impl Circle3d {
    pub fn new(center: Point3d, normal: Vec3, radius: f64) -> Self {
        let normal = normal.normalized().unwrap_or(Vec3::Z);
        Self {
            center,
            normal,
            radius,
            x_axis: normal.any_perpendicular(),
        }
    }

    pub fn with_axes(center: Point3d, normal: Vec3, x_axis: Vec3, radius: f64) -> Self {
        Self {
            center,
            normal: normal.normalized().unwrap_or(Vec3::Z),
            x_axis: x_axis.normalized().unwrap_or(Vec3::X),
            radius,
        }
    }

    pub fn y_axis(&self) -> Vec3 {
        self.normal.cross(&self.x_axis)
    }

    /// Angle in `[0, 2*PI)` of the projection of `p` onto the circle plane.
    pub fn parameter_of(&self, p: &Point3d) -> f64 {
        let v = *p - self.center;
        let a = v.dot(&self.y_axis()).atan2(v.dot(&self.x_axis));
        if a < 0.0 { a + TAU } else { a }
    }

    pub fn circumference(&self) -> f64 {
        TAU * self.radius
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            center: self.center + offset,
            ..*self
        }
    }

    /// Exact axis-aligned extent of the circle.
    fn exact_box(&self) -> BoundingBox {
        let ext = |n: f64| self.radius * (1.0 - n * n).max(0.0).sqrt();
        let e = Vec3::new(ext(self.normal.x), ext(self.normal.y), ext(self.normal.z));
        BoundingBox::new(self.center - e, self.center + e)
    }
}

impl ParametricCurve for Circle3d {
    fn domain(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn evaluate(&self, t: f64) -> Point3d {
        self.center
            + self.x_axis * (self.radius * t.cos())
            + self.y_axis() * (self.radius * t.sin())
    }

    fn derivative(&self, t: f64) -> Vec3 {
        self.x_axis * (-self.radius * t.sin()) + self.y_axis() * (self.radius * t.cos())
    }

    fn second_derivative(&self, t: f64) -> Vec3 {
        self.x_axis * (-self.radius * t.cos()) + self.y_axis() * (-self.radius * t.sin())
    }

    fn is_closed(&self) -> bool {
        true
    }

    fn length(&self) -> f64 {
        self.circumference()
    }

    fn closest_point(&self, p: &Point3d) -> (f64, Point3d) {
        let t = self.parameter_of(p);
        (t, self.evaluate(t))
    }

    fn bounding_box(&self) -> BoundingBox {
        self.exact_box()
    }
}

/// A circular arc: the part of `circle` between two angles, `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc3d {
    pub circle: Circle3d,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl Arc3d {
    pub fn new(circle: Circle3d, start_angle: f64, end_angle: f64) -> Self {
        Self {
            circle,
            start_angle,
            end_angle,
        }
    }

    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    /// Map an angle into `[start, start + 2*PI)`.
    fn unwrap_angle(&self, a: f64) -> f64 {
        self.start_angle + (a - self.start_angle).rem_euclid(TAU)
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            circle: self.circle.translated(offset),
            ..*self
        }
    }
}

impl ParametricCurve for Arc3d {
    fn domain(&self) -> (f64, f64) {
        (self.start_angle, self.end_angle)
    }

    fn evaluate(&self, t: f64) -> Point3d {
        self.circle.evaluate(t)
    }

    fn derivative(&self, t: f64) -> Vec3 {
        self.circle.derivative(t)
    }

    fn second_derivative(&self, t: f64) -> Vec3 {
        self.circle.second_derivative(t)
    }

    fn length(&self) -> f64 {
        self.circle.radius * self.sweep().abs()
    }

    fn closest_point(&self, p: &Point3d) -> (f64, Point3d) {
        let a = self.unwrap_angle(self.circle.parameter_of(p));
        if a <= self.end_angle {
            return (a, self.evaluate(a));
        }
        let s = self.evaluate(self.start_angle);
        let e = self.evaluate(self.end_angle);
        if s.distance_squared_to(p) <= e.distance_squared_to(p) {
            (self.start_angle, s)
        } else {
            (self.end_angle, e)
        }
    }
}

/// An ellipse in 3D space, parameterized over `[0, 2*PI]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse3d {
    pub center: Point3d,
    pub normal: Vec3,
    pub major_axis: Vec3,
    pub major_radius: f64,
    pub minor_radius: f64,
}

impl Ellipse3d {
    pub fn new(
        center: Point3d,
        normal: Vec3,
        major_axis: Vec3,
        major_radius: f64,
        minor_radius: f64,
    ) -> Self {
        Self {
            center,
            normal: normal.normalized().unwrap_or(Vec3::Z),
            major_axis: major_axis.normalized().unwrap_or(Vec3::X),
            major_radius,
            minor_radius,
        }
    }

    fn minor_axis(&self) -> Vec3 {
        self.normal.cross(&self.major_axis)
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            center: self.center + offset,
            ..*self
        }
    }
}

impl ParametricCurve for Ellipse3d {
    fn domain(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn evaluate(&self, t: f64) -> Point3d {
        self.center
            + self.major_axis * (self.major_radius * t.cos())
            + self.minor_axis() * (self.minor_radius * t.sin())
    }

    fn derivative(&self, t: f64) -> Vec3 {
        self.major_axis * (-self.major_radius * t.sin())
            + self.minor_axis() * (self.minor_radius * t.cos())
    }

    fn second_derivative(&self, t: f64) -> Vec3 {
        self.major_axis * (-self.major_radius * t.cos())
            + self.minor_axis() * (-self.minor_radius * t.sin())
    }

    fn is_closed(&self) -> bool {
        true
    }
}

/// Ordered vertex chain, parameterized by vertex index over `[0, n - 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point3d>,
}

impl Polyline {
    pub fn new(points: Vec<Point3d>) -> Self {
        Self { points }
    }

    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    fn segment_at(&self, t: f64) -> (usize, f64) {
        let n = self.segment_count();
        if n == 0 {
            return (0, 0.0);
        }
        let t = t.clamp(0.0, n as f64);
        let i = (t.floor() as usize).min(n - 1);
        (i, t - i as f64)
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self::new(self.points.iter().map(|p| *p + offset).collect())
    }
}

impl ParametricCurve for Polyline {
    fn domain(&self) -> (f64, f64) {
        (0.0, self.segment_count().max(1) as f64)
    }

    fn evaluate(&self, t: f64) -> Point3d {
        match self.points.len() {
            0 => Point3d::ORIGIN,
            1 => self.points[0],
            _ => {
                let (i, s) = self.segment_at(t);
                self.points[i].lerp(&self.points[i + 1], s)
            }
        }
    }

    fn derivative(&self, t: f64) -> Vec3 {
        if self.points.len() < 2 {
            return Vec3::ZERO;
        }
        let (i, _) = self.segment_at(t);
        self.points[i + 1] - self.points[i]
    }

    fn second_derivative(&self, _t: f64) -> Vec3 {
        Vec3::ZERO
    }

    fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
    }

    fn closest_point(&self, p: &Point3d) -> (f64, Point3d) {
        if self.points.len() < 2 {
            return (0.0, self.evaluate(0.0));
        }
        let mut best = (0.0, self.points[0]);
        let mut best_d = f64::INFINITY;
        for (i, w) in self.points.windows(2).enumerate() {
            let (s, q) = Line3d::new(w[0], w[1]).closest_point(p);
            let d = q.distance_squared_to(p);
            if d < best_d {
                best_d = d;
                best = (i as f64 + s, q);
            }
        }
        best
    }

    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }
}

impl Curve {
    fn as_dyn(&self) -> &dyn ParametricCurve {
        match self {
            Curve::Line(c) => c,
            Curve::Circle(c) => c,
            Curve::Arc(c) => c,
            Curve::Ellipse(c) => c,
            Curve::Polyline(c) => c,
            Curve::Nurbs(c) => c,
        }
    }

    pub fn translated(&self, offset: Vec3) -> Curve {
        match self {
            Curve::Line(c) => Curve::Line(c.translated(offset)),
            Curve::Circle(c) => Curve::Circle(c.translated(offset)),
            Curve::Arc(c) => Curve::Arc(c.translated(offset)),
            Curve::Ellipse(c) => Curve::Ellipse(c.translated(offset)),
            Curve::Polyline(c) => Curve::Polyline(c.translated(offset)),
            Curve::Nurbs(c) => Curve::Nurbs(c.translated(offset)),
        }
    }

    /// Curve type name for logging/debugging.
    pub fn curve_type_name(&self) -> &'static str {
        match self {
            Curve::Line(_) => "Line",
            Curve::Circle(_) => "Circle",
            Curve::Arc(_) => "Arc",
            Curve::Ellipse(_) => "Ellipse",
            Curve::Polyline(_) => "Polyline",
            Curve::Nurbs(_) => "Nurbs",
        }
    }
}

impl ParametricCurve for Curve {
    fn domain(&self) -> (f64, f64) {
        self.as_dyn().domain()
    }

    fn evaluate(&self, t: f64) -> Point3d {
        self.as_dyn().evaluate(t)
    }

    fn derivative(&self, t: f64) -> Vec3 {
        self.as_dyn().derivative(t)
    }

    fn second_derivative(&self, t: f64) -> Vec3 {
        self.as_dyn().second_derivative(t)
    }

    fn is_closed(&self) -> bool {
        self.as_dyn().is_closed()
    }

    fn length(&self) -> f64 {
        self.as_dyn().length()
    }

    fn closest_point(&self, p: &Point3d) -> (f64, Point3d) {
        self.as_dyn().closest_point(p)
    }

    fn bounding_box(&self) -> BoundingBox {
        self.as_dyn().bounding_box()
    }
}

/// A half-infinite ray for shooting queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Point3d,
    pub direction: Vec3,
}

impl Ray {
    /// Ray with a unit direction; `None` for a zero direction.
    pub fn new(origin: Point3d, direction: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            direction: direction.normalized()?,
        })
    }

    pub fn at(&self, t: f64) -> Point3d {
        self.origin + self.direction * t
    }
}
