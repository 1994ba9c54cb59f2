//! Near-miss search: point pairs closer than a search radius but farther
//! apart than the intersection tolerance.

use geo_kernel::geometry::Point3d;
use geo_kernel::{ParametricCurve, ParametricSurface};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::context::ModelContext;
use crate::error::{IntersectError, Outcome};
use crate::value::GeometryValue;

const MIN_SAMPLES: usize = 3;
const MAX_SAMPLES: usize = 100_000;
const GOLDEN_ITERATIONS: usize = 80;

/// Index-correlated near-miss pairs: `locations_a[i]` on operand A lies
/// `distances[i]` from `locations_b[i]` on operand B.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearMissResult {
    pub locations_a: Vec<Point3d>,
    pub locations_b: Vec<Point3d>,
    pub distances: Vec<f64>,
}

impl NearMissResult {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    fn push(&mut self, pair: Pair) {
        self.locations_a.push(pair.a);
        self.locations_b.push(pair.b);
        self.distances.push(pair.distance);
    }
}

#[derive(Debug, Clone, Copy)]
struct Pair {
    a: Point3d,
    b: Point3d,
    distance: f64,
}

impl Pair {
    fn flipped(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            distance: self.distance,
        }
    }
}

/// Sample intervals along a curve of `length` so spacing stays within `radius`.
pub fn sample_count(length: f64, radius: f64) -> usize {
    let n = (length / radius).ceil();
    if n.is_finite() && n > MIN_SAMPLES as f64 {
        (n as usize).min(MAX_SAMPLES)
    } else {
        MIN_SAMPLES
    }
}

/// Minimize `f` on `[lo, hi]` by golden-section search.
fn golden_section(f: impl Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> f64 {
    let ratio = (5f64.sqrt() - 1.0) / 2.0;
    let mut x1 = hi - ratio * (hi - lo);
    let mut x2 = lo + ratio * (hi - lo);
    let (mut f1, mut f2) = (f(x1), f(x2));
    for _ in 0..GOLDEN_ITERATIONS {
        if f1 <= f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - ratio * (hi - lo);
            f1 = f(x1);
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + ratio * (hi - lo);
            f2 = f(x2);
        }
    }
    0.5 * (lo + hi)
}

/// Indices of sampled local minima of `dist` that lie below `radius`.
fn local_minima(dist: &[f64], radius: f64) -> Vec<usize> {
    (0..dist.len())
        .filter(|&k| {
            let d = dist[k];
            d < radius
                && (k == 0 || d <= dist[k - 1])
                && dist.get(k + 1).is_none_or(|&next| d <= next)
        })
        .collect()
}

/// Sample `src`, project each sample with `closest`, and refine every
/// sampled local minimum closer than `radius`. Each refined minimum is kept
/// or dropped on its own, so a true intersection next to a near miss never
/// hides it.
fn search_from(
    src: &dyn ParametricCurve,
    closest: &dyn Fn(&Point3d) -> Point3d,
    radius: f64,
    tolerance: f64,
) -> Vec<Pair> {
    let samples = src.sample(sample_count(src.length(), radius) + 1);
    let dist: Vec<f64> = samples
        .iter()
        .map(|(_, p)| p.distance_to(&closest(p)))
        .collect();
    let gap = |t: f64| {
        let p = src.evaluate(t);
        p.distance_to(&closest(&p))
    };

    let mut out = Vec::new();
    for k in local_minima(&dist, radius) {
        let lo = samples[k.saturating_sub(1)].0;
        let hi = samples[(k + 1).min(samples.len() - 1)].0;
        let refined = golden_section(gap, lo, hi);
        let t = if gap(refined) <= dist[k] { refined } else { samples[k].0 };
        let a = src.evaluate(t);
        let b = closest(&a);
        let distance = a.distance_to(&b);
        if distance > tolerance && distance < radius {
            out.push(Pair { a, b, distance });
        }
    }
    out
}

fn curve_curve(
    a: &dyn ParametricCurve,
    b: &dyn ParametricCurve,
    radius: f64,
    tolerance: f64,
) -> Vec<Pair> {
    let onto_b = |p: &Point3d| b.closest_point(p).1;
    let onto_a = |p: &Point3d| a.closest_point(p).1;
    let mut pairs = search_from(a, &onto_b, radius, tolerance);
    pairs.extend(search_from(b, &onto_a, radius, tolerance).into_iter().map(Pair::flipped));
    pairs
}

fn curve_surface(
    curve: &dyn ParametricCurve,
    surface: &dyn ParametricSurface,
    radius: f64,
    tolerance: f64,
) -> Vec<Pair> {
    let onto_surface = |p: &Point3d| surface.closest_point(p).2;
    search_from(curve, &onto_surface, radius, tolerance)
}

/// Drop pairs whose both ends repeat an earlier pair within `merge`.
fn dedupe(pairs: Vec<Pair>, merge: f64) -> Vec<Pair> {
    let mut out: Vec<Pair> = Vec::with_capacity(pairs.len());
    for p in pairs {
        let seen = out
            .iter()
            .any(|q| q.a.distance_to(&p.a) <= merge && q.b.distance_to(&p.b) <= merge);
        if !seen {
            out.push(p);
        }
    }
    out
}

/// Find near-miss pairs between two operands.
///
/// Curve-curve pairs are searched from both sides; curve-surface pairs from
/// the curve only. Every other pair fails with `NearMissSearchFailed`.
#[instrument(skip(a, b, ctx), fields(kind_a = %a.kind(), kind_b = %b.kind()))]
pub fn find_near_misses(
    a: &GeometryValue,
    b: &GeometryValue,
    search_radius: f64,
    ctx: &ModelContext,
) -> Outcome<NearMissResult> {
    ctx.validate()?;
    let tolerance = ctx.absolute_tolerance;
    if !(search_radius.is_finite() && search_radius > tolerance) {
        return Err(IntersectError::InvalidParameter {
            name: "search_radius",
            reason: format!(
                "must be finite and above the tolerance {tolerance}, got {search_radius}"
            ),
        }
        .into());
    }

    let pairs = match (a.as_curve(), b.as_curve(), a.as_surface(), b.as_surface()) {
        (Some(ca), Some(cb), _, _) => curve_curve(ca, cb, search_radius, tolerance),
        (Some(ca), _, _, Some(sb)) => curve_surface(ca, sb, search_radius, tolerance),
        (_, Some(cb), Some(sa), _) => curve_surface(cb, sa, search_radius, tolerance)
            .into_iter()
            .map(Pair::flipped)
            .collect(),
        _ => {
            return Err(IntersectError::NearMissSearchFailed {
                reason: format!("no near-miss search for {} x {}", a.kind(), b.kind()),
            }
            .into());
        }
    };

    let mut result = NearMissResult::default();
    for pair in dedupe(pairs, (10.0 * tolerance).max(1e-9)) {
        result.push(pair);
    }
    debug!(count = result.len(), search_radius, "near-miss search complete");
    Ok(result)
}
