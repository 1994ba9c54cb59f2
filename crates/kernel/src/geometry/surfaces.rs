use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use super::bbox::BoundingBox;
use super::point::Point3d;
use super::vector::Vec3;
use crate::traits::ParametricSurface;

/// Bounded parametric surfaces. Planes are kept apart (see [`Plane`]) since
/// they are unbounded and have closed-form intersections with everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Surface {
    Sphere(Sphere),
    Cylinder(Cylinder),
    Cone(Cone),
    Torus(Torus),
}

/// An infinite plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3d,
    pub normal: Vec3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
}

impl Plane {
    /// Plane through `origin`. A zero normal is kept as zero so validation can
    /// report it.
    pub fn new(origin: Point3d, normal: Vec3) -> Self {
        let normal = normal.normalized().unwrap_or(Vec3::ZERO);
        let u_axis = normal.any_perpendicular();
        let v_axis = normal.cross(&u_axis);
        Self {
            origin,
            normal,
            u_axis,
            v_axis,
        }
    }

    pub fn xy() -> Self {
        Self {
            origin: Point3d::ORIGIN,
            normal: Vec3::Z,
            u_axis: Vec3::X,
            v_axis: Vec3::Y,
        }
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        self.origin + self.u_axis * u + self.v_axis * v
    }

    /// Signed distance along the normal.
    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        (*p - self.origin).dot(&self.normal)
    }

    pub fn project_point(&self, p: &Point3d) -> Point3d {
        *p - self.normal * self.distance_to_point(p)
    }

    pub fn parameters_of(&self, p: &Point3d) -> (f64, f64) {
        let v = *p - self.origin;
        (v.dot(&self.u_axis), v.dot(&self.v_axis))
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            origin: self.origin + offset,
            ..*self
        }
    }
}

fn reference_direction(axis: &Vec3) -> Vec3 {
    axis.any_perpendicular()
}

/// A sphere, `u` = longitude in `[0, 2*PI]`, `v` = latitude in `[-PI/2, PI/2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Point3d,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Point3d, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self::new(self.center + offset, self.radius)
    }

    /// Angular parameters of the radial projection of `p`.
    pub fn parameters_of(&self, p: &Point3d) -> (f64, f64) {
        let d = (*p - self.center).normalized().unwrap_or(Vec3::X);
        let u = d.y.atan2(d.x).rem_euclid(TAU);
        let v = d.z.clamp(-1.0, 1.0).asin();
        (u, v)
    }
}

impl ParametricSurface for Sphere {
    fn domain_u(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn domain_v(&self) -> (f64, f64) {
        (-FRAC_PI_2, FRAC_PI_2)
    }

    fn evaluate(&self, u: f64, v: f64) -> Point3d {
        let cos_v = v.cos();
        Point3d::new(
            self.center.x + self.radius * cos_v * u.cos(),
            self.center.y + self.radius * cos_v * u.sin(),
            self.center.z + self.radius * v.sin(),
        )
    }

    fn normal_at(&self, u: f64, v: f64) -> Vec3 {
        Vec3::new(v.cos() * u.cos(), v.cos() * u.sin(), v.sin())
    }

    fn closest_point(&self, p: &Point3d) -> (f64, f64, Point3d) {
        let (u, v) = self.parameters_of(p);
        (u, v, self.evaluate(u, v))
    }

    fn bounding_box(&self) -> BoundingBox {
        let r = Vec3::new(self.radius, self.radius, self.radius);
        BoundingBox::new(self.center - r, self.center + r)
    }
}

/// A finite cylinder, `u` = angle, `v` = height along the axis in `[0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub origin: Point3d,
    pub axis: Vec3,
    pub radius: f64,
    pub height: f64,
    pub ref_dir: Vec3,
}

impl Cylinder {
    pub fn new(origin: Point3d, axis: Vec3, radius: f64, height: f64) -> Self {
        let axis = axis.normalized().unwrap_or(Vec3::Z);
        Self {
            origin,
            axis,
            radius,
            height,
            ref_dir: reference_direction(&axis),
        }
    }

    fn y_dir(&self) -> Vec3 {
        self.axis.cross(&self.ref_dir)
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            origin: self.origin + offset,
            ..*self
        }
    }
}

impl ParametricSurface for Cylinder {
    fn domain_u(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn domain_v(&self) -> (f64, f64) {
        (0.0, self.height)
    }

    fn evaluate(&self, u: f64, v: f64) -> Point3d {
        self.origin
            + self.ref_dir * (self.radius * u.cos())
            + self.y_dir() * (self.radius * u.sin())
            + self.axis * v
    }

    fn normal_at(&self, u: f64, _v: f64) -> Vec3 {
        self.ref_dir * u.cos() + self.y_dir() * u.sin()
    }

    fn closest_point(&self, p: &Point3d) -> (f64, f64, Point3d) {
        let d = *p - self.origin;
        let v = d.dot(&self.axis).clamp(0.0, self.height);
        let u = d.dot(&self.y_dir()).atan2(d.dot(&self.ref_dir)).rem_euclid(TAU);
        (u, v, self.evaluate(u, v))
    }
}

/// A finite cone opening from `apex`, `v` = distance along the axis in `[0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cone {
    pub apex: Point3d,
    pub axis: Vec3,
    pub half_angle: f64,
    pub height: f64,
    pub ref_dir: Vec3,
}

impl Cone {
    pub fn new(apex: Point3d, axis: Vec3, half_angle: f64, height: f64) -> Self {
        let axis = axis.normalized().unwrap_or(Vec3::Z);
        Self {
            apex,
            axis,
            half_angle,
            height,
            ref_dir: reference_direction(&axis),
        }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            apex: self.apex + offset,
            ..*self
        }
    }
}

impl ParametricSurface for Cone {
    fn domain_u(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn domain_v(&self) -> (f64, f64) {
        (0.0, self.height)
    }

    fn evaluate(&self, u: f64, v: f64) -> Point3d {
        let y_dir = self.axis.cross(&self.ref_dir);
        let r = v * self.half_angle.tan();
        self.apex + self.axis * v + self.ref_dir * (r * u.cos()) + y_dir * (r * u.sin())
    }

    fn normal_at(&self, u: f64, _v: f64) -> Vec3 {
        let y_dir = self.axis.cross(&self.ref_dir);
        let radial = self.ref_dir * u.cos() + y_dir * u.sin();
        (radial * self.half_angle.cos() - self.axis * self.half_angle.sin())
            .normalized()
            .unwrap_or(radial)
    }
}

/// A torus around `axis`, `u` = major angle, `v` = minor angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Torus {
    pub center: Point3d,
    pub axis: Vec3,
    pub major_radius: f64,
    pub minor_radius: f64,
}

impl Torus {
    pub fn new(center: Point3d, axis: Vec3, major_radius: f64, minor_radius: f64) -> Self {
        Self {
            center,
            axis: axis.normalized().unwrap_or(Vec3::Z),
            major_radius,
            minor_radius,
        }
    }

    fn ring(&self, u: f64) -> (Point3d, Vec3) {
        let ref_dir = reference_direction(&self.axis);
        let y_dir = self.axis.cross(&ref_dir);
        let radial = ref_dir * u.cos() + y_dir * u.sin();
        (self.center + radial * self.major_radius, radial)
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            center: self.center + offset,
            ..*self
        }
    }
}

impl ParametricSurface for Torus {
    fn domain_u(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn domain_v(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn evaluate(&self, u: f64, v: f64) -> Point3d {
        let (ring_center, radial) = self.ring(u);
        ring_center
            + radial * (self.minor_radius * v.cos())
            + self.axis * (self.minor_radius * v.sin())
    }

    fn normal_at(&self, u: f64, v: f64) -> Vec3 {
        let (_, radial) = self.ring(u);
        radial * v.cos() + self.axis * v.sin()
    }
}

impl Surface {
    fn as_dyn(&self) -> &dyn ParametricSurface {
        match self {
            Surface::Sphere(s) => s,
            Surface::Cylinder(s) => s,
            Surface::Cone(s) => s,
            Surface::Torus(s) => s,
        }
    }

    pub fn translated(&self, offset: Vec3) -> Surface {
        match self {
            Surface::Sphere(s) => Surface::Sphere(s.translated(offset)),
            Surface::Cylinder(s) => Surface::Cylinder(s.translated(offset)),
            Surface::Cone(s) => Surface::Cone(s.translated(offset)),
            Surface::Torus(s) => Surface::Torus(s.translated(offset)),
        }
    }

    pub fn surface_type_name(&self) -> &'static str {
        match self {
            Surface::Sphere(_) => "Sphere",
            Surface::Cylinder(_) => "Cylinder",
            Surface::Cone(_) => "Cone",
            Surface::Torus(_) => "Torus",
        }
    }
}

impl ParametricSurface for Surface {
    fn domain_u(&self) -> (f64, f64) {
        self.as_dyn().domain_u()
    }

    fn domain_v(&self) -> (f64, f64) {
        self.as_dyn().domain_v()
    }

    fn evaluate(&self, u: f64, v: f64) -> Point3d {
        self.as_dyn().evaluate(u, v)
    }

    fn normal_at(&self, u: f64, v: f64) -> Vec3 {
        self.as_dyn().normal_at(u, v)
    }

    fn partials(&self, u: f64, v: f64) -> (Vec3, Vec3) {
        self.as_dyn().partials(u, v)
    }

    fn closest_point(&self, p: &Point3d) -> (f64, f64, Point3d) {
        self.as_dyn().closest_point(p)
    }

    fn bounding_box(&self) -> BoundingBox {
        self.as_dyn().bounding_box()
    }
}
