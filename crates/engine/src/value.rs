//! Operand values, kind tags and specificity chains.

use std::fmt;
use std::sync::Arc;

use geo_kernel::geometry::{
    Arc3d, BoundingBox, Brep, Circle3d, Curve, Cylinder, Line3d, Mesh, Plane, Point3d, Ray, Sphere,
    Surface, Tessellation, Vec3,
};
use geo_kernel::traits::TranslatedCurve;
use geo_kernel::{ParametricCurve, ParametricSurface};
use serde::{Deserialize, Serialize};

/// A geometry operand. The engine only inspects its kind; payloads are
/// handed to the native computations untouched.
#[derive(Debug, Clone)]
pub enum GeometryValue {
    /// Any kernel curve without a more specific tag (ellipse, polyline, NURBS).
    Curve(Curve),
    /// Any kernel surface without a more specific tag (cone, torus).
    Surface(Surface),
    Brep(Brep),
    Mesh(Mesh),
    Line(Line3d),
    Plane(Plane),
    Circle(Circle3d),
    Arc(Arc3d),
    Sphere(Sphere),
    Cylinder(Cylinder),
    BoundingBox(BoundingBox),
    PointCloud(Vec<Point3d>),
    Ray(Ray),
    Collection(Vec<GeometryValue>),
    /// Caller-defined curve type. It has no strategies of its own and
    /// resolves through the generic curve ones.
    UserCurve(Arc<dyn ParametricCurve>),
}

/// Closed set of kind tags used as dispatch keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryKind {
    Curve,
    Surface,
    Brep,
    Mesh,
    Line,
    Plane,
    Circle,
    Arc,
    Sphere,
    Cylinder,
    BoundingBox,
    PointCloud,
    Ray,
    Collection,
    UserCurve,
}

/// Capability sets shared by otherwise unrelated kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Can be turned into a triangle soup with face provenance.
    Tessellated,
}

/// One entry of a specificity chain: a concrete or ancestor kind, or a
/// capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispatchKey {
    Kind(GeometryKind),
    Capability(Capability),
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchKey::Kind(k) => write!(f, "{k}"),
            DispatchKey::Capability(c) => write!(f, "{c:?}"),
        }
    }
}

const CURVE: DispatchKey = DispatchKey::Kind(GeometryKind::Curve);
const SURFACE: DispatchKey = DispatchKey::Kind(GeometryKind::Surface);
const TESSELLATED: DispatchKey = DispatchKey::Capability(Capability::Tessellated);

impl GeometryKind {
    pub const ALL: [GeometryKind; 15] = [
        GeometryKind::Curve,
        GeometryKind::Surface,
        GeometryKind::Brep,
        GeometryKind::Mesh,
        GeometryKind::Line,
        GeometryKind::Plane,
        GeometryKind::Circle,
        GeometryKind::Arc,
        GeometryKind::Sphere,
        GeometryKind::Cylinder,
        GeometryKind::BoundingBox,
        GeometryKind::PointCloud,
        GeometryKind::Ray,
        GeometryKind::Collection,
        GeometryKind::UserCurve,
    ];

    /// Position in [`GeometryKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Curve => "Curve",
            GeometryKind::Surface => "Surface",
            GeometryKind::Brep => "Brep",
            GeometryKind::Mesh => "Mesh",
            GeometryKind::Line => "Line",
            GeometryKind::Plane => "Plane",
            GeometryKind::Circle => "Circle",
            GeometryKind::Arc => "Arc",
            GeometryKind::Sphere => "Sphere",
            GeometryKind::Cylinder => "Cylinder",
            GeometryKind::BoundingBox => "BoundingBox",
            GeometryKind::PointCloud => "PointCloud",
            GeometryKind::Ray => "Ray",
            GeometryKind::Collection => "Collection",
            GeometryKind::UserCurve => "UserCurve",
        }
    }

    /// Self, then ancestor kinds, then capabilities, most specific first.
    pub fn specificity_chain(self) -> &'static [DispatchKey] {
        use GeometryKind as K;
        match self {
            K::Line => &[DispatchKey::Kind(K::Line), CURVE],
            K::Circle => &[DispatchKey::Kind(K::Circle), CURVE],
            K::Arc => &[DispatchKey::Kind(K::Arc), CURVE],
            K::UserCurve => &[DispatchKey::Kind(K::UserCurve), CURVE],
            K::Curve => &[CURVE],
            K::Sphere => &[DispatchKey::Kind(K::Sphere), SURFACE],
            K::Cylinder => &[DispatchKey::Kind(K::Cylinder), SURFACE],
            K::Surface => &[SURFACE],
            K::Mesh => &[DispatchKey::Kind(K::Mesh), TESSELLATED],
            K::Brep => &[DispatchKey::Kind(K::Brep), TESSELLATED],
            K::BoundingBox => &[DispatchKey::Kind(K::BoundingBox), TESSELLATED],
            K::Plane => &[DispatchKey::Kind(K::Plane)],
            K::Ray => &[DispatchKey::Kind(K::Ray)],
            K::PointCloud => &[DispatchKey::Kind(K::PointCloud)],
            K::Collection => &[DispatchKey::Kind(K::Collection)],
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl GeometryValue {
    pub fn kind(&self) -> GeometryKind {
        match self {
            GeometryValue::Curve(_) => GeometryKind::Curve,
            GeometryValue::Surface(_) => GeometryKind::Surface,
            GeometryValue::Brep(_) => GeometryKind::Brep,
            GeometryValue::Mesh(_) => GeometryKind::Mesh,
            GeometryValue::Line(_) => GeometryKind::Line,
            GeometryValue::Plane(_) => GeometryKind::Plane,
            GeometryValue::Circle(_) => GeometryKind::Circle,
            GeometryValue::Arc(_) => GeometryKind::Arc,
            GeometryValue::Sphere(_) => GeometryKind::Sphere,
            GeometryValue::Cylinder(_) => GeometryKind::Cylinder,
            GeometryValue::BoundingBox(_) => GeometryKind::BoundingBox,
            GeometryValue::PointCloud(_) => GeometryKind::PointCloud,
            GeometryValue::Ray(_) => GeometryKind::Ray,
            GeometryValue::Collection(_) => GeometryKind::Collection,
            GeometryValue::UserCurve(_) => GeometryKind::UserCurve,
        }
    }

    /// Tag a kernel curve with its most specific kind.
    pub fn from_curve(curve: Curve) -> Self {
        match curve {
            Curve::Line(l) => GeometryValue::Line(l),
            Curve::Circle(c) => GeometryValue::Circle(c),
            Curve::Arc(a) => GeometryValue::Arc(a),
            other => GeometryValue::Curve(other),
        }
    }

    /// Tag a kernel surface with its most specific kind.
    pub fn from_surface(surface: Surface) -> Self {
        match surface {
            Surface::Sphere(s) => GeometryValue::Sphere(s),
            Surface::Cylinder(c) => GeometryValue::Cylinder(c),
            other => GeometryValue::Surface(other),
        }
    }

    pub fn user_curve(curve: impl ParametricCurve + 'static) -> Self {
        GeometryValue::UserCurve(Arc::new(curve))
    }

    pub fn as_curve(&self) -> Option<&dyn ParametricCurve> {
        match self {
            GeometryValue::Curve(c) => Some(c),
            GeometryValue::Line(l) => Some(l),
            GeometryValue::Circle(c) => Some(c),
            GeometryValue::Arc(a) => Some(a),
            GeometryValue::UserCurve(c) => Some(c.as_ref()),
            _ => None,
        }
    }

    pub fn as_surface(&self) -> Option<&dyn ParametricSurface> {
        match self {
            GeometryValue::Surface(s) => Some(s),
            GeometryValue::Sphere(s) => Some(s),
            GeometryValue::Cylinder(c) => Some(c),
            _ => None,
        }
    }

    /// Triangles with source-face provenance, for kinds with the
    /// [`Capability::Tessellated`] capability.
    pub fn tessellation(&self) -> Option<Tessellation> {
        match self {
            GeometryValue::Mesh(m) => Some(m.tessellation()),
            GeometryValue::Brep(b) => Some(b.tessellation()),
            GeometryValue::BoundingBox(bb) => Some(Tessellation::from_box(bb)),
            _ => None,
        }
    }

    /// Bounded extent. Unbounded kinds (planes, rays) have none.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if let Some(c) = self.as_curve() {
            return Some(c.bounding_box());
        }
        if let Some(s) = self.as_surface() {
            return Some(s.bounding_box());
        }
        match self {
            GeometryValue::Mesh(m) => Some(m.bounding_box()),
            GeometryValue::Brep(b) => Some(b.bounding_box()),
            GeometryValue::BoundingBox(bb) => Some(*bb),
            GeometryValue::PointCloud(pts) => Some(BoundingBox::from_points(pts)),
            GeometryValue::Collection(items) => items
                .iter()
                .filter_map(GeometryValue::bounding_box)
                .reduce(|acc, bb| acc.union(&bb)),
            _ => None,
        }
    }

    /// Curves and surfaces can be rigidly moved for stability analysis.
    pub fn is_perturbable(&self) -> bool {
        self.as_curve().is_some() || self.as_surface().is_some()
    }

    /// A translated copy of a curve or surface operand; `None` for any other kind.
    pub fn translated(&self, offset: Vec3) -> Option<GeometryValue> {
        let moved = match self {
            GeometryValue::Curve(c) => GeometryValue::Curve(c.translated(offset)),
            GeometryValue::Line(l) => GeometryValue::Line(l.translated(offset)),
            GeometryValue::Circle(c) => GeometryValue::Circle(c.translated(offset)),
            GeometryValue::Arc(a) => GeometryValue::Arc(a.translated(offset)),
            GeometryValue::UserCurve(c) => {
                GeometryValue::UserCurve(Arc::new(TranslatedCurve::new(Arc::clone(c), offset)))
            }
            GeometryValue::Surface(s) => GeometryValue::Surface(s.translated(offset)),
            GeometryValue::Sphere(s) => GeometryValue::Sphere(s.translated(offset)),
            GeometryValue::Cylinder(c) => GeometryValue::Cylinder(c.translated(offset)),
            _ => return None,
        };
        Some(moved)
    }
}

impl From<Curve> for GeometryValue {
    fn from(curve: Curve) -> Self {
        GeometryValue::from_curve(curve)
    }
}

impl From<Surface> for GeometryValue {
    fn from(surface: Surface) -> Self {
        GeometryValue::from_surface(surface)
    }
}

impl From<Mesh> for GeometryValue {
    fn from(mesh: Mesh) -> Self {
        GeometryValue::Mesh(mesh)
    }
}

impl From<Brep> for GeometryValue {
    fn from(brep: Brep) -> Self {
        GeometryValue::Brep(brep)
    }
}

impl From<Plane> for GeometryValue {
    fn from(plane: Plane) -> Self {
        GeometryValue::Plane(plane)
    }
}

impl From<Ray> for GeometryValue {
    fn from(ray: Ray) -> Self {
        GeometryValue::Ray(ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_kernel::geometry::Polyline;

    #[test]
    fn test_index_matches_all_order() {
        for (i, k) in GeometryKind::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
        }
    }

    #[test]
    fn test_every_chain_starts_with_self() {
        for k in GeometryKind::ALL {
            assert_eq!(k.specificity_chain()[0], DispatchKey::Kind(k));
        }
    }

    #[test]
    fn test_from_curve_picks_specific_kind() {
        let line = Curve::Line(Line3d::new(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0)));
        assert_eq!(GeometryValue::from(line).kind(), GeometryKind::Line);
        let poly =
            Curve::Polyline(Polyline::new(vec![Point3d::ORIGIN, Point3d::new(1.0, 1.0, 0.0)]));
        assert_eq!(GeometryValue::from(poly).kind(), GeometryKind::Curve);
    }

    #[test]
    fn test_translated_user_curve_keeps_kind() {
        let line = Line3d::new(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0));
        let v = GeometryValue::user_curve(line);
        let moved = v.translated(Vec3::new(0.0, 0.0, 2.0)).unwrap();
        assert_eq!(moved.kind(), GeometryKind::UserCurve);
        let p = moved.as_curve().unwrap().evaluate(0.0);
        assert!((p.z - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_plane_is_not_perturbable() {
        assert!(!GeometryValue::Plane(Plane::xy()).is_perturbable());
        assert!(GeometryValue::Plane(Plane::xy()).translated(Vec3::X).is_none());
    }
}
