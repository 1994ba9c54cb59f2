//! End-to-end behaviour of the public operations.

use approx::assert_relative_eq;
use geo_kernel::geometry::{
    BoundingBox, Brep, Circle3d, Line3d, Mesh, Plane, Point3d, Ray, Sphere, Vec3,
};
use geo_kernel::validation::ErrorCode;
use geo_kernel::ParametricCurve;
use intersect_engine::*;

fn circle(x: f64) -> GeometryValue {
    GeometryValue::Circle(Circle3d::new(Point3d::new(x, 0.0, 0.0), Vec3::Z, 1.0))
}

fn segment(a: (f64, f64, f64), b: (f64, f64, f64)) -> GeometryValue {
    GeometryValue::Line(Line3d::new(Point3d::new(a.0, a.1, a.2), Point3d::new(b.0, b.1, b.2)))
}

fn unit_box() -> BoundingBox {
    BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0))
}

fn box_mesh(bb: &BoundingBox) -> Mesh {
    let quads = [
        [0, 4, 6, 2],
        [1, 3, 7, 5],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 2, 3, 1],
        [4, 5, 7, 6],
    ];
    let faces = quads
        .iter()
        .flat_map(|q| [[q[0], q[1], q[2]], [q[0], q[2], q[3]]])
        .collect();
    Mesh::new(bb.corners().to_vec(), faces)
}

/// A caller-defined curve with no strategies of its own.
#[derive(Debug)]
struct Parabola {
    scale: f64,
}

impl ParametricCurve for Parabola {
    fn domain(&self) -> (f64, f64) {
        (-2.0, 2.0)
    }

    fn evaluate(&self, t: f64) -> Point3d {
        Point3d::new(t, self.scale * t * t, 0.0)
    }

    fn derivative(&self, t: f64) -> Vec3 {
        Vec3::new(1.0, 2.0 * self.scale * t, 0.0)
    }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn test_overlapping_circles_meet_twice_and_have_no_near_miss() {
    let ctx = ModelContext::default();
    let (a, b) = (circle(0.0), circle(1.5));
    let out = intersect(&a, &b, &ctx).unwrap();
    assert_eq!(out.points.len(), 2);
    for p in &out.points {
        assert_relative_eq!(p.x, 0.75, epsilon = 1e-9);
        assert_relative_eq!(p.y.abs(), (1.0f64 - 0.5625).sqrt(), epsilon = 1e-9);
    }
    assert_eq!(out.parameters_a.len(), 2);
    assert_eq!(out.parameters_b.len(), 2);

    let near = find_near_misses(&a, &b, 0.01, &ctx).unwrap();
    assert!(near.is_empty(), "true intersections are not near misses: {near:?}");
}

#[test]
fn test_separated_circles_are_only_a_near_miss() {
    let ctx = ModelContext::default();
    let (a, b) = (circle(0.0), circle(2.001));
    let out = intersect(&a, &b, &ctx).unwrap();
    assert!(out.is_empty());

    let near = find_near_misses(&a, &b, 0.01, &ctx).unwrap();
    assert_eq!(near.len(), 1);
    assert_relative_eq!(near.distances[0], 0.001, epsilon = 1e-7);
    assert!(near.locations_a[0].distance_to(&Point3d::new(1.0, 0.0, 0.0)) < 1e-5);
    assert!(near.locations_b[0].distance_to(&Point3d::new(1.001, 0.0, 0.0)) < 1e-5);
}

#[test]
fn test_user_curve_resolves_to_generic_curve_pair() {
    let resolved = StrategyTable::global()
        .resolve(GeometryKind::UserCurve, GeometryKind::Line)
        .unwrap();
    assert_eq!(resolved.strategy.name, "Curve x Curve");
    assert!(!resolved.swapped);

    let parabola = GeometryValue::user_curve(Parabola { scale: 1.0 });
    let chord = segment((-3.0, 1.0, 0.0), (3.0, 1.0, 0.0));
    let out = intersect(&parabola, &chord, &ModelContext::default()).unwrap();
    assert_eq!(out.points.len(), 2);
    for p in &out.points {
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.x.abs(), 1.0, epsilon = 1e-6);
    }
}

// ─── Classification ──────────────────────────────────────────────────────────

#[test]
fn test_right_angle_crossing_is_transverse() {
    let ctx = ModelContext::default();
    let a = segment((-1.0, 0.0, 0.0), (1.0, 0.0, 0.0));
    let b = segment((0.0, -1.0, 0.0), (0.0, 1.0, 0.0));
    let out = intersect(&a, &b, &ctx).unwrap();
    let c = classify(&out, &a, &b, &ctx).unwrap();
    assert_eq!(c.kind, ClassificationKind::Transverse);
    assert!(!c.is_grazing);
    assert_eq!(c.blend_score, 0.5);
    assert_relative_eq!(c.approach_angles[0], std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
}

#[test]
fn test_touching_circles_are_tangent() {
    let ctx = ModelContext::default();
    let (a, b) = (circle(0.0), circle(2.0));
    let out = intersect(&a, &b, &ctx).unwrap();
    assert_eq!(out.points.len(), 1);
    let c = classify(&out, &a, &b, &ctx).unwrap();
    assert_eq!(c.kind, ClassificationKind::Tangent);
    assert_eq!(c.blend_score, 1.0);
    assert!(c.is_grazing);
}

#[test]
fn test_non_curve_pair_is_unknown() {
    let ctx = ModelContext::default();
    let line = segment((0.0, 0.0, -2.0), (0.0, 0.0, 2.0));
    let sphere = GeometryValue::Sphere(Sphere::new(Point3d::ORIGIN, 1.0));
    let out = intersect(&line, &sphere, &ctx).unwrap();
    assert_eq!(out.points.len(), 2);
    let c = classify(&out, &line, &sphere, &ctx).unwrap();
    assert_eq!(c.kind, ClassificationKind::Unknown);
    assert!(c.approach_angles.is_empty());
}

#[test]
fn test_classifying_an_empty_output_fails() {
    let ctx = ModelContext::default();
    let empty = IntersectionOutput::default();
    let err = classify(&empty, &circle(0.0), &circle(5.0), &ctx).unwrap_err();
    assert!(matches!(err.first(), IntersectError::InsufficientData { .. }));
}

// ─── Stability ───────────────────────────────────────────────────────────────

#[test]
fn test_zero_point_base_is_trivially_stable() {
    let ctx = ModelContext::default();
    let plane = GeometryValue::Plane(Plane::xy());
    let r = analyze_stability(&IntersectionOutput::default(), &plane, &plane, &ctx).unwrap();
    assert_eq!(r, StabilityResult::stable());
    assert_eq!((r.score, r.sensitivity), (1.0, 0.0));
    assert!(r.unstable_flags.is_empty());
}

#[test]
fn test_transverse_crossing_is_stable() {
    let ctx = ModelContext::default();
    let line = segment((0.2, 0.1, -1.0), (0.3, -0.1, 1.0));
    let plane = GeometryValue::Plane(Plane::xy());
    let base = intersect(&line, &plane, &ctx).unwrap();
    let r = analyze_stability(&base, &line, &plane, &ctx).unwrap();
    assert_eq!(r.score, 1.0);
    assert_eq!(r.sensitivity, 0.0);
    assert_eq!(r.unstable_flags, vec![false]);
}

#[test]
fn test_tangent_contact_is_sensitive() {
    let ctx = ModelContext::default();
    let sphere = GeometryValue::Sphere(Sphere::new(Point3d::new(0.0, 0.0, 1.0), 1.0));
    let plane = GeometryValue::Plane(Plane::xy());
    let base = intersect(&sphere, &plane, &ctx).unwrap();
    assert_eq!(base.points.len(), 1);
    let r = analyze_stability(&base, &sphere, &plane, &ctx).unwrap();
    assert!(r.score < 1.0);
    assert!(r.sensitivity > 0.0);
    assert_eq!(r.unstable_flags.len(), 1);
}

#[test]
fn test_stability_is_reproducible() {
    let ctx = ModelContext::default();
    let (a, b) = (circle(0.0), circle(1.5));
    let base = intersect(&a, &b, &ctx).unwrap();
    let first = analyze_stability(&base, &a, &b, &ctx).unwrap();
    let second = analyze_stability(&base, &a, &b, &ctx).unwrap();
    assert_eq!(first.score.to_bits(), second.score.to_bits());
    assert_eq!(first.unstable_flags, second.unstable_flags);
    assert_eq!(first.unstable_flags.len(), 2);
}

// ─── Tessellated and ray pairs ───────────────────────────────────────────────

#[test]
fn test_overlapping_meshes_produce_sections() {
    let ctx = ModelContext::default();
    let other = BoundingBox::new(Point3d::new(0.5, 0.3, 0.2), Point3d::new(1.5, 1.3, 1.2));
    let a = GeometryValue::Mesh(box_mesh(&unit_box()));
    let b = GeometryValue::Mesh(box_mesh(&other));

    let opts = IntersectOptions::new().with_indices(true).with_sorted(true);
    let out = intersect_with(&a, &b, &ctx, &opts).unwrap();
    assert!(!out.points.is_empty());
    assert_eq!(out.face_indices.len(), out.points.len());
    assert!(!out.sections.is_empty());
    assert!(out.sections.len() < out.points.len());
    let grown_a = unit_box().expanded(1e-9);
    let grown_b = other.expanded(1e-9);
    for p in &out.points {
        assert!(grown_a.contains_point(p) && grown_b.contains_point(p));
    }

    let fast = intersect(&a, &b, &ctx).unwrap();
    assert_eq!(fast.sections.len(), fast.points.len());
    assert!(fast.face_indices.is_empty());
}

#[test]
fn test_brep_and_mesh_meet_through_tessellation() {
    let ctx = ModelContext::default();
    let shifted = BoundingBox::new(Point3d::new(0.5, 0.3, 0.2), Point3d::new(1.5, 1.3, 1.2));
    let resolved = StrategyTable::global()
        .resolve(GeometryKind::Mesh, GeometryKind::Brep)
        .unwrap();
    assert_eq!(resolved.strategy.name, "Tessellated x Tessellated");
    let out = intersect(
        &GeometryValue::Mesh(box_mesh(&unit_box())),
        &GeometryValue::Brep(Brep::cuboid(&shifted)),
        &ctx,
    )
    .unwrap();
    assert!(!out.points.is_empty());
}

#[test]
fn test_ray_through_box_respects_max_hits() {
    let ctx = ModelContext::default();
    let ray = GeometryValue::Ray(Ray::new(Point3d::new(0.3, 0.6, -5.0), Vec3::Z).unwrap());
    let bb = GeometryValue::BoundingBox(unit_box());

    let all = intersect_with(&ray, &bb, &ctx, &IntersectOptions::new().with_indices(true)).unwrap();
    assert_eq!(all.points.len(), 2);
    assert_relative_eq!(all.points[0].z, 0.0, epsilon = 1e-12);
    assert_eq!(all.face_indices, vec![4, 5]);

    let first = intersect_with(&ray, &bb, &ctx, &IntersectOptions::new().with_max_hits(1)).unwrap();
    assert_eq!(first.points.len(), 1);
}

#[test]
fn test_points_project_onto_box_top() {
    let ctx = ModelContext::default();
    let cloud = GeometryValue::PointCloud(vec![
        Point3d::new(0.25, 0.25, 3.0),
        Point3d::new(4.0, 4.0, 3.0),
        Point3d::new(0.75, 0.5, 2.0),
    ]);
    let bb = GeometryValue::BoundingBox(unit_box());
    let opts = IntersectOptions::new().with_indices(true);
    let out = intersect_with(&cloud, &bb, &ctx, &opts).unwrap();
    assert_eq!(out.points.len(), 2);
    for p in &out.points {
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-12);
    }
    assert_eq!(out.face_indices, vec![5, 5]);
}

#[test]
fn test_swapped_ray_sphere_keeps_caller_order() {
    let ctx = ModelContext::default();
    let ray = GeometryValue::Ray(Ray::new(Point3d::new(-5.0, 0.0, 0.0), Vec3::X).unwrap());
    let sphere = GeometryValue::Sphere(Sphere::new(Point3d::ORIGIN, 1.0));
    let out = intersect(&sphere, &ray, &ctx).unwrap();
    assert_eq!(out.points.len(), 2);
    assert!(matches!(out.parameters_a[0], Param::Surface { .. }));
    assert!(matches!(out.parameters_b[0], Param::Curve(_)));
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[test]
fn test_plane_pair_is_unsupported() {
    let plane = GeometryValue::Plane(Plane::xy());
    let err = intersect(&plane, &plane, &ModelContext::default()).unwrap_err();
    assert_eq!(
        err.first(),
        &IntersectError::UnsupportedOperation {
            kind_a: GeometryKind::Plane,
            kind_b: GeometryKind::Plane,
        }
    );
}

#[test]
fn test_degenerate_operand_fails_validation_in_caller_slot() {
    let ctx = ModelContext::default();
    let plane = GeometryValue::Plane(Plane::xy());
    let flat = GeometryValue::Circle(Circle3d::new(Point3d::ORIGIN, Vec3::Z, 0.0));
    let err = intersect(&plane, &flat, &ctx).unwrap_err();
    match err.first() {
        IntersectError::ValidationFailed { slot, code, requirement, .. } => {
            assert_eq!(*slot, Slot::B);
            assert_eq!(*code, ErrorCode::ZeroRadius);
            assert_eq!(*requirement, "Degeneracy");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_open_brep_fails_topology() {
    let mut open = Brep::cuboid(&unit_box());
    open.faces.pop();
    let solid = GeometryValue::Brep(Brep::cuboid(&unit_box()));
    let opts = IntersectOptions::new().with_failure_policy(FailurePolicy::Accumulate);
    let open = GeometryValue::Brep(open);
    let err = intersect_with(&open, &solid, &ModelContext::default(), &opts).unwrap_err();
    assert_eq!(err.error_count(), 4);
    assert!(err.errors().iter().all(|e| matches!(
        e,
        IntersectError::ValidationFailed { slot: Slot::A, code: ErrorCode::FreeEdge, .. }
    )));
}

#[test]
fn test_coincident_spheres_are_a_computation_failure() {
    let s = GeometryValue::Sphere(Sphere::new(Point3d::ORIGIN, 1.0));
    let err = intersect(&s, &s, &ModelContext::default()).unwrap_err();
    assert!(matches!(
        err.first(),
        IntersectError::ComputationFailed { strategy: "Sphere x Sphere", .. }
    ));
}
