//! Property-based tests for the public operations using the `proptest` crate.

use approx::assert_abs_diff_eq;
use proptest::prelude::*;

use geo_kernel::geometry::{Circle3d, Curve, Line3d, Point3d, Polyline, Sphere, Vec3};
use intersect_engine::{
    GeometryValue, ModelContext, NearMissResult, Param, StrategyTable, classify, find_near_misses,
    intersect,
};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_planar_point() -> impl Strategy<Value = Point3d> {
    (-10.0f64..10.0, -10.0f64..10.0).prop_map(|(x, y)| Point3d::new(x, y, 0.0))
}

fn arb_segment() -> impl Strategy<Value = Line3d> {
    (arb_planar_point(), arb_planar_point())
        .prop_filter("segment too short", |(a, b)| a.distance_to(b) > 1e-2)
        .prop_map(|(a, b)| Line3d::new(a, b))
}

fn curve_param(p: &Param) -> f64 {
    p.as_curve().unwrap_or(f64::NAN)
}

fn arb_space_point() -> impl Strategy<Value = Point3d> {
    (-3.0f64..3.0, -3.0f64..3.0, -3.0f64..3.0).prop_map(|(x, y, z)| Point3d::new(x, y, z))
}

fn arb_chord() -> impl Strategy<Value = Line3d> {
    (arb_space_point(), arb_space_point())
        .prop_filter("chord too short", |(a, b)| a.distance_to(b) > 0.5)
        .prop_map(|(a, b)| Line3d::new(a, b))
}

/// The x axis from -1 to 1, and a polyline crossing it at the origin that
/// dips back to `dip` above it at x = 0.2.
fn crossing_with_dip(dip: f64) -> (GeometryValue, GeometryValue) {
    let axis = GeometryValue::Line(Line3d::new(
        Point3d::new(-1.0, 0.0, 0.0),
        Point3d::new(1.0, 0.0, 0.0),
    ));
    let wave = GeometryValue::Curve(Curve::Polyline(Polyline::new(vec![
        Point3d::new(-1.0, 0.0, -1.0),
        Point3d::ORIGIN,
        Point3d::new(0.1, 0.0, 2.0 * dip),
        Point3d::new(0.2, 0.0, dip),
        Point3d::new(1.0, 0.0, 1.0),
    ])));
    (axis, wave)
}

/// Every pair of `small` has a pair in `large` with both ends nearby.
fn contained_in(small: &NearMissResult, large: &NearMissResult) -> bool {
    (0..small.len()).all(|i| {
        (0..large.len()).any(|j| {
            small.locations_a[i].distance_to(&large.locations_a[j]) < 1e-6
                && small.locations_b[i].distance_to(&large.locations_b[j]) < 1e-6
        })
    })
}

fn unit_circle_at(x: f64) -> GeometryValue {
    GeometryValue::Circle(Circle3d::new(Point3d::new(x, 0.0, 0.0), Vec3::Z, 1.0))
}

// ---------------------------------------------------------------------------
// Operand order only swaps the parameter channels
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn swapping_operands_swaps_parameters(la in arb_segment(), lb in arb_segment()) {
        let ctx = ModelContext::default();
        let (a, b) = (GeometryValue::Line(la), GeometryValue::Line(lb));
        let ab = intersect(&a, &b, &ctx).unwrap();
        let ba = intersect(&b, &a, &ctx).unwrap();
        prop_assert_eq!(ab.points.len(), ba.points.len());
        for i in 0..ab.points.len() {
            let (ab_a, ab_b) = (curve_param(&ab.parameters_a[i]), curve_param(&ab.parameters_b[i]));
            let (ba_a, ba_b) = (curve_param(&ba.parameters_a[i]), curve_param(&ba.parameters_b[i]));
            assert_abs_diff_eq!(ab_a, ba_b, epsilon = 1e-6);
            assert_abs_diff_eq!(ab_b, ba_a, epsilon = 1e-6);
            prop_assert!(ab.points[i].distance_to(&ba.points[i]) < 1e-6);
        }
    }
}

proptest! {
    #[test]
    fn swapped_dispatch_exchanges_parameters(chord in arb_chord()) {
        let ctx = ModelContext::default();
        let line = GeometryValue::Line(chord);
        let sphere = GeometryValue::Sphere(Sphere::new(Point3d::ORIGIN, 1.5));
        let resolved = StrategyTable::global().resolve(sphere.kind(), line.kind()).unwrap();
        prop_assert!(resolved.swapped);

        let direct = intersect(&line, &sphere, &ctx).unwrap();
        let swapped = intersect(&sphere, &line, &ctx).unwrap();
        prop_assert_eq!(&direct.points, &swapped.points);
        prop_assert_eq!(&direct.parameters_a, &swapped.parameters_b);
        prop_assert_eq!(&direct.parameters_b, &swapped.parameters_a);
        for (pa, pb) in swapped.parameters_a.iter().zip(&swapped.parameters_b) {
            prop_assert!(matches!(pa, Param::Surface { .. }), "expected Param::Surface, got {:?}", pa);
            prop_assert!(matches!(pb, Param::Curve(_)));
        }
    }
}

// ---------------------------------------------------------------------------
// Classification is a pure function of its inputs
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn classification_is_repeatable(la in arb_segment(), lb in arb_segment()) {
        let ctx = ModelContext::default();
        let (a, b) = (GeometryValue::Line(la), GeometryValue::Line(lb));
        let out = intersect(&a, &b, &ctx).unwrap();
        prop_assume!(!out.points.is_empty());
        let first = classify(&out, &a, &b, &ctx).unwrap();
        let second = classify(&out, &a, &b, &ctx).unwrap();
        prop_assert_eq!(first, second);
    }
}

// ---------------------------------------------------------------------------
// Near misses of separated circles
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn gap_inside_radius_is_found(gap in 0.002f64..0.05, radius in 0.06f64..0.2) {
        let ctx = ModelContext::default();
        let (a, b) = (unit_circle_at(0.0), unit_circle_at(2.0 + gap));
        let near = find_near_misses(&a, &b, radius, &ctx).unwrap();
        prop_assert_eq!(near.len(), 1);
        assert_abs_diff_eq!(near.distances[0], gap, epsilon = 1e-6);
    }

    #[test]
    fn gap_outside_radius_is_ignored(gap in 0.01f64..0.05, shrink in 0.1f64..0.9) {
        let ctx = ModelContext::default();
        let (a, b) = (unit_circle_at(0.0), unit_circle_at(2.0 + gap));
        let near = find_near_misses(&a, &b, gap * shrink, &ctx).unwrap();
        prop_assert!(near.is_empty());
    }
}

// ---------------------------------------------------------------------------
// A larger search radius never loses a near miss
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn near_misses_grow_with_radius(
        dip in 0.001f64..0.004,
        margin in 0.0005f64..0.003,
        extra in 0.0f64..0.03,
    ) {
        let ctx = ModelContext::default();
        let (axis, wave) = crossing_with_dip(dip);
        let r1 = dip + margin;
        let r2 = r1 + extra;
        let small = find_near_misses(&axis, &wave, r1, &ctx).unwrap();
        let large = find_near_misses(&axis, &wave, r2, &ctx).unwrap();
        prop_assert_eq!(small.len(), 1);
        prop_assert!(
            contained_in(&small, &large),
            "r1 {} -> {:?}, r2 {} -> {:?}",
            r1,
            small,
            r2,
            large
        );
    }

    #[test]
    fn circle_near_misses_grow_with_radius(
        gap in 0.002f64..0.05,
        r1 in 0.001f64..0.06,
        extra in 0.0f64..0.1,
    ) {
        let ctx = ModelContext::default();
        let (a, b) = (unit_circle_at(0.0), unit_circle_at(2.0 + gap));
        let small = find_near_misses(&a, &b, r1, &ctx).unwrap();
        let large = find_near_misses(&a, &b, r1 + extra, &ctx).unwrap();
        prop_assert!(contained_in(&small, &large));
    }
}
