//! The fixed declarative strategy list and the computations behind it.
//!
//! Each computation receives its operands in registered order, already
//! checked against the strategy's validation requirements.

use geo_kernel::geometry::{Plane, Point3d, Tessellation};
use geo_kernel::intersection::mesh::{
    curve_tessellation, project_points, ray_tessellation, tessellation_plane,
    tessellation_tessellation,
};
use geo_kernel::intersection::{
    CurveIntersection, SurfaceIntersection, SurfaceSurfaceHit, analytic, curve_curve, curve_surface,
    surface_surface,
};
use geo_kernel::{KernelError, ParametricCurve, ParametricSurface, Tolerance};

use crate::context::ExecutionOptions;
use crate::output::NativeResult;
use crate::validate::ValidationRequirement as V;
use crate::value::{Capability, DispatchKey, GeometryKind as K, GeometryValue};

use super::{ComputeFn, Strategy};

fn mismatch(expected: &str, got: &GeometryValue) -> KernelError {
    KernelError::invalid(format!("expected a {expected} operand, got {}", got.kind()))
}

macro_rules! expect_kind {
    ($value:expr, $variant:ident) => {
        match $value {
            GeometryValue::$variant(inner) => Ok(inner),
            other => Err(mismatch(stringify!($variant), other)),
        }
    };
}

fn curve_of(v: &GeometryValue) -> Result<&dyn ParametricCurve, KernelError> {
    v.as_curve().ok_or_else(|| mismatch("curve", v))
}

fn surface_of(v: &GeometryValue) -> Result<&dyn ParametricSurface, KernelError> {
    v.as_surface().ok_or_else(|| mismatch("surface", v))
}

fn tessellation_of(v: &GeometryValue) -> Result<Tessellation, KernelError> {
    v.tessellation().ok_or_else(|| mismatch("tessellated", v))
}

/// Normalize an analytic surface result; `uv` maps a contact point to the
/// parameters on each surface.
fn surface_result(
    result: SurfaceIntersection,
    uv: impl Fn(&Point3d) -> ((f64, f64), (f64, f64)),
) -> Result<NativeResult, KernelError> {
    let (hits, curves) = match result {
        SurfaceIntersection::None => (Vec::new(), Vec::new()),
        SurfaceIntersection::Point(point) => {
            let (uv1, uv2) = uv(&point);
            (vec![SurfaceSurfaceHit { point, uv1, uv2 }], Vec::new())
        }
        SurfaceIntersection::Curve(curve) => (Vec::new(), vec![curve]),
        SurfaceIntersection::Coincident => {
            return Err(KernelError::degenerate(
                "surfaces coincide; intersection is not a curve or point set",
            ));
        }
    };
    Ok(NativeResult::SurfaceSurface { hits, curves })
}

// ─── Curves ──────────────────────────────────────────────────────────────────

fn line_line(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let r = analytic::line_line(expect_kind!(a, Line)?, expect_kind!(b, Line)?, tol)?;
    Ok(NativeResult::CurveCurve(r))
}

fn circle_circle(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let r = analytic::circle_circle(expect_kind!(a, Circle)?, expect_kind!(b, Circle)?, tol)?;
    Ok(NativeResult::CurveCurve(r))
}

fn curve_curve(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let hits = curve_curve::curve_curve(curve_of(a)?, curve_of(b)?, tol);
    Ok(NativeResult::CurveCurve(CurveIntersection::from_hits(hits)))
}

fn line_plane(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let r = analytic::line_plane(expect_kind!(a, Line)?, expect_kind!(b, Plane)?, tol)?;
    Ok(NativeResult::CurveSurface(r))
}

fn curve_plane(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let r = curve_surface::curve_plane(curve_of(a)?, expect_kind!(b, Plane)?, tol)?;
    Ok(NativeResult::CurveSurface(r))
}

fn curve_surface(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let hits = curve_surface::curve_surface(curve_of(a)?, surface_of(b)?, tol);
    Ok(NativeResult::CurveSurface(CurveIntersection::from_hits(hits)))
}

// ─── Surfaces ────────────────────────────────────────────────────────────────

fn sphere_sphere(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let (s1, s2) = (expect_kind!(a, Sphere)?, expect_kind!(b, Sphere)?);
    surface_result(analytic::sphere_sphere(s1, s2, tol), |p| {
        (s1.parameters_of(p), s2.parameters_of(p))
    })
}

fn sphere_plane(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let (sphere, plane) = (expect_kind!(a, Sphere)?, expect_kind!(b, Plane)?);
    check_plane(plane)?;
    surface_result(analytic::plane_sphere(plane, sphere, tol), |p| {
        (sphere.parameters_of(p), plane.parameters_of(p))
    })
}

fn surface_plane(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let hits = surface_surface::surface_plane(surface_of(a)?, expect_kind!(b, Plane)?, tol)?;
    Ok(NativeResult::SurfaceSurface {
        hits,
        curves: Vec::new(),
    })
}

fn surface_surface(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let hits = surface_surface::surface_surface(surface_of(a)?, surface_of(b)?, tol);
    Ok(NativeResult::SurfaceSurface {
        hits,
        curves: Vec::new(),
    })
}

fn check_plane(plane: &Plane) -> Result<(), KernelError> {
    match plane.normal.normalized() {
        Some(_) => Ok(()),
        None => Err(KernelError::degenerate("plane normal is zero")),
    }
}

// ─── Tessellated ─────────────────────────────────────────────────────────────

fn tessellated_pair(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    opts: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let (ta, tb) = (tessellation_of(a)?, tessellation_of(b)?);
    Ok(NativeResult::Section(tessellation_tessellation(&ta, &tb, tol, opts.sorted)))
}

fn tessellated_plane(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    opts: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let plane = expect_kind!(b, Plane)?;
    let section = tessellation_plane(&tessellation_of(a)?, plane, tol, opts.sorted)?;
    Ok(NativeResult::Section(section))
}

fn curve_tessellated(
    a: &GeometryValue,
    b: &GeometryValue,
    tol: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let hits = curve_tessellation(curve_of(a)?, &tessellation_of(b)?, tol);
    Ok(NativeResult::CurveMesh(hits))
}

fn point_cloud_tessellated(
    a: &GeometryValue,
    b: &GeometryValue,
    _: &Tolerance,
    opts: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let points = expect_kind!(a, PointCloud)?;
    let hits = project_points(points, &tessellation_of(b)?, &opts.projection_direction);
    Ok(NativeResult::Projection(hits))
}

// ─── Rays ────────────────────────────────────────────────────────────────────

fn ray_plane(
    a: &GeometryValue,
    b: &GeometryValue,
    _: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let plane = expect_kind!(b, Plane)?;
    check_plane(plane)?;
    let hit = analytic::ray_plane(expect_kind!(a, Ray)?, plane);
    Ok(NativeResult::Ray(hit.into_iter().collect()))
}

fn ray_sphere(
    a: &GeometryValue,
    b: &GeometryValue,
    _: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let hits = analytic::ray_sphere(expect_kind!(a, Ray)?, expect_kind!(b, Sphere)?);
    Ok(NativeResult::Ray(hits))
}

fn ray_cylinder(
    a: &GeometryValue,
    b: &GeometryValue,
    _: &Tolerance,
    _: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let hits = analytic::ray_cylinder(expect_kind!(a, Ray)?, expect_kind!(b, Cylinder)?);
    Ok(NativeResult::Ray(hits))
}

fn ray_tessellated(
    a: &GeometryValue,
    b: &GeometryValue,
    _: &Tolerance,
    opts: &ExecutionOptions,
) -> Result<NativeResult, KernelError> {
    let hits = ray_tessellation(expect_kind!(a, Ray)?, &tessellation_of(b)?, opts.max_hits);
    Ok(NativeResult::RayMesh(hits))
}

// ─── Registry ────────────────────────────────────────────────────────────────

const fn kind(k: K) -> DispatchKey {
    DispatchKey::Kind(k)
}

const TESSELLATED: DispatchKey = DispatchKey::Capability(Capability::Tessellated);

const CURVE_CHECKS: V = V::DEGENERACY.union(V::NURBS_GEOMETRY);
const SURFACE_CHECKS: V = V::DEGENERACY.union(V::UV_DOMAIN);

const fn strategy(
    name: &'static str,
    key_a: DispatchKey,
    key_b: DispatchKey,
    compute: ComputeFn,
    requirement_a: V,
    requirement_b: V,
) -> Strategy {
    Strategy {
        name,
        key_a,
        key_b,
        compute,
        requirement_a,
        requirement_b,
    }
}

/// Every registered kind pair. Order matters only between duplicate
/// registrations, where the earlier entry wins.
pub static STRATEGIES: [Strategy; 20] = [
    strategy(
        "Line x Line",
        kind(K::Line),
        kind(K::Line),
        line_line,
        V::DEGENERACY.union(V::FINITE),
        V::DEGENERACY.union(V::FINITE),
    ),
    strategy(
        "Circle x Circle",
        kind(K::Circle),
        kind(K::Circle),
        circle_circle,
        V::DEGENERACY,
        V::DEGENERACY,
    ),
    strategy(
        "Curve x Curve",
        kind(K::Curve),
        kind(K::Curve),
        curve_curve,
        CURVE_CHECKS,
        CURVE_CHECKS,
    ),
    strategy(
        "Line x Plane",
        kind(K::Line),
        kind(K::Plane),
        line_plane,
        V::DEGENERACY,
        V::DEGENERACY,
    ),
    strategy(
        "Curve x Plane",
        kind(K::Curve),
        kind(K::Plane),
        curve_plane,
        CURVE_CHECKS,
        V::DEGENERACY,
    ),
    strategy(
        "Curve x Surface",
        kind(K::Curve),
        kind(K::Surface),
        curve_surface,
        CURVE_CHECKS,
        SURFACE_CHECKS,
    ),
    strategy(
        "Sphere x Sphere",
        kind(K::Sphere),
        kind(K::Sphere),
        sphere_sphere,
        V::DEGENERACY,
        V::DEGENERACY,
    ),
    strategy(
        "Sphere x Plane",
        kind(K::Sphere),
        kind(K::Plane),
        sphere_plane,
        V::DEGENERACY,
        V::DEGENERACY,
    ),
    strategy(
        "Surface x Plane",
        kind(K::Surface),
        kind(K::Plane),
        surface_plane,
        SURFACE_CHECKS,
        V::DEGENERACY,
    ),
    strategy(
        "Surface x Surface",
        kind(K::Surface),
        kind(K::Surface),
        surface_surface,
        SURFACE_CHECKS,
        SURFACE_CHECKS,
    ),
    strategy(
        "Mesh x Mesh",
        kind(K::Mesh),
        kind(K::Mesh),
        tessellated_pair,
        V::MESH_SPECIFIC,
        V::MESH_SPECIFIC,
    ),
    strategy(
        "Brep x Brep",
        kind(K::Brep),
        kind(K::Brep),
        tessellated_pair,
        V::TOPOLOGY,
        V::TOPOLOGY,
    ),
    strategy(
        "Tessellated x Tessellated",
        TESSELLATED,
        TESSELLATED,
        tessellated_pair,
        V::FINITE,
        V::FINITE,
    ),
    strategy(
        "Tessellated x Plane",
        TESSELLATED,
        kind(K::Plane),
        tessellated_plane,
        V::FINITE,
        V::DEGENERACY,
    ),
    strategy(
        "Curve x Tessellated",
        kind(K::Curve),
        TESSELLATED,
        curve_tessellated,
        CURVE_CHECKS,
        V::FINITE,
    ),
    strategy("Ray x Plane", kind(K::Ray), kind(K::Plane), ray_plane, V::DEGENERACY, V::DEGENERACY),
    strategy(
        "Ray x Sphere",
        kind(K::Ray),
        kind(K::Sphere),
        ray_sphere,
        V::DEGENERACY,
        V::DEGENERACY,
    ),
    strategy(
        "Ray x Cylinder",
        kind(K::Ray),
        kind(K::Cylinder),
        ray_cylinder,
        V::DEGENERACY,
        V::DEGENERACY,
    ),
    strategy(
        "Ray x Tessellated",
        kind(K::Ray),
        TESSELLATED,
        ray_tessellated,
        V::DEGENERACY,
        V::FINITE,
    ),
    strategy(
        "PointCloud x Tessellated",
        kind(K::PointCloud),
        TESSELLATED,
        point_cloud_tessellated,
        V::FINITE.union(V::DEGENERACY),
        V::FINITE,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ModelContext;
    use geo_kernel::geometry::{Circle3d, Sphere, Vec3};

    fn opts() -> ExecutionOptions {
        ExecutionOptions::from_context(&ModelContext::default()).unwrap()
    }

    #[test]
    fn test_registered_pairs_are_unique() {
        for (i, s) in STRATEGIES.iter().enumerate() {
            for other in &STRATEGIES[i + 1..] {
                assert!(!other.matches(s.key_a, s.key_b), "duplicate {}", s.name);
            }
        }
    }

    #[test]
    fn test_kind_mismatch_is_a_kernel_error() {
        let circle = GeometryValue::Circle(Circle3d::new(Point3d::ORIGIN, Vec3::Z, 1.0));
        let tol = Tolerance::default();
        assert!(matches!(
            line_line(&circle, &circle, &tol, &opts()),
            Err(KernelError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_coincident_spheres_fail() {
        let s = GeometryValue::Sphere(Sphere::new(Point3d::ORIGIN, 1.0));
        let tol = Tolerance::default();
        assert!(matches!(
            sphere_sphere(&s, &s, &tol, &opts()),
            Err(KernelError::Degenerate { .. })
        ));
    }

    #[test]
    fn test_tangent_sphere_plane_reports_point() {
        let s = GeometryValue::Sphere(Sphere::new(Point3d::new(0.0, 0.0, 1.0), 1.0));
        let p = GeometryValue::Plane(Plane::xy());
        let tol = Tolerance::default();
        match sphere_plane(&s, &p, &tol, &opts()).unwrap() {
            NativeResult::SurfaceSurface { hits, curves } => {
                assert_eq!(hits.len(), 1);
                assert!(curves.is_empty());
                assert!(hits[0].point.distance_to(&Point3d::ORIGIN) < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
