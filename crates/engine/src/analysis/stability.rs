//! Sensitivity of an intersection's point count to small rigid moves of
//! one operand.

use std::f64::consts::{PI, TAU};

use geo_kernel::geometry::Vec3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::context::{IntersectOptions, ModelContext};
use crate::dispatch::StrategyTable;
use crate::error::Outcome;
use crate::executor;
use crate::output::IntersectionOutput;
use crate::value::GeometryValue;

pub const DIRECTION_COUNT: usize = 8;
/// Perturbation distance as a fraction of the moved operand's bounding-box diagonal.
pub const RELATIVE_MAGNITUDE: f64 = 1e-3;
/// A per-direction count change above this marks its bucket unstable.
const UNSTABLE_DELTA: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityResult {
    /// `1 / (1 + mean |delta|)`; 1.0 is perfectly stable.
    pub score: f64,
    /// `max |delta| / base point count`.
    pub sensitivity: f64,
    /// One flag per base point.
    pub unstable_flags: Vec<bool>,
}

impl StabilityResult {
    pub fn stable() -> Self {
        Self {
            score: 1.0,
            sensitivity: 0.0,
            unstable_flags: Vec::new(),
        }
    }
}

/// Eight fixed unit directions from a polar x azimuth grid.
pub fn perturbation_directions() -> Vec<Vec3> {
    let polar_steps = (DIRECTION_COUNT as f64).sqrt().ceil() as usize;
    let azimuth_steps = DIRECTION_COUNT.div_ceil(polar_steps);
    let mut dirs = Vec::with_capacity(polar_steps * azimuth_steps);
    for i in 0..polar_steps {
        let theta = PI * (i as f64 + 0.5) / polar_steps as f64;
        for j in 0..azimuth_steps {
            let phi = TAU * j as f64 / azimuth_steps as f64;
            dirs.push(Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()));
        }
    }
    dirs.truncate(DIRECTION_COUNT);
    dirs
}

/// Flag per base point: the valid deltas are split into `base_count`
/// contiguous buckets and a bucket is unstable if any of its deltas
/// exceeds [`UNSTABLE_DELTA`]. Positional only; bucket `k` is not tied
/// geometrically to base point `k`.
fn bucket_flags(deltas: &[f64], base_count: usize) -> Vec<bool> {
    let m = deltas.len();
    (0..base_count)
        .map(|k| {
            let start = k * m / base_count;
            let end = ((k + 1) * m / base_count).max(start + 1).min(m);
            deltas[start.min(m)..end].iter().any(|&d| d > UNSTABLE_DELTA)
        })
        .collect()
}

/// Stability with the context's default intersection options.
pub fn analyze_stability(
    base: &IntersectionOutput,
    a: &GeometryValue,
    b: &GeometryValue,
    ctx: &ModelContext,
) -> Outcome<StabilityResult> {
    analyze_stability_with(base, a, b, ctx, &IntersectOptions::default())
}

/// Recompute the intersection with one operand moved along each of the
/// fixed directions and measure how much the point count changes.
///
/// Operand A is moved if it is a curve or surface, otherwise B. With
/// neither movable, or no successful recomputation, the result is the
/// trivially stable one.
#[instrument(
    skip_all,
    fields(kind_a = %a.kind(), kind_b = %b.kind(), base_points = base.points.len())
)]
pub fn analyze_stability_with(
    base: &IntersectionOutput,
    a: &GeometryValue,
    b: &GeometryValue,
    ctx: &ModelContext,
    options: &IntersectOptions,
) -> Outcome<StabilityResult> {
    let base_count = base.points.len();
    if base_count == 0 {
        return Ok(StabilityResult::stable());
    }
    let opts = options.resolve(ctx)?;

    let move_a = a.is_perturbable();
    if !move_a && !b.is_perturbable() {
        warn!("neither operand can be perturbed; reporting stable");
        return Ok(StabilityResult::stable());
    }
    let moved = if move_a { a } else { b };
    let magnitude = RELATIVE_MAGNITUDE * moved.bounding_box().map_or(0.0, |bb| bb.diagonal());
    let table = StrategyTable::global();

    let delta_for = |dir: &Vec3| -> Option<f64> {
        // The clone lives only for this direction.
        let clone = moved.translated(*dir * magnitude)?;
        let (pa, pb) = if move_a { (&clone, b) } else { (a, &clone) };
        match executor::execute(table, pa, pb, &opts) {
            Ok(out) => Some((out.points.len() as f64 - base_count as f64).abs()),
            Err(f) => {
                debug!(error = %f, "perturbed recomputation failed; direction discarded");
                None
            }
        }
    };

    let directions = perturbation_directions();
    #[cfg(feature = "parallel")]
    let per_direction: Vec<Option<f64>> = directions.par_iter().map(delta_for).collect();
    #[cfg(not(feature = "parallel"))]
    let per_direction: Vec<Option<f64>> = directions.iter().map(delta_for).collect();

    let deltas: Vec<f64> = per_direction.into_iter().flatten().collect();
    if deltas.is_empty() {
        warn!("every perturbed recomputation failed; reporting stable");
        return Ok(StabilityResult::stable());
    }

    let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    let max = deltas.iter().copied().fold(0.0, f64::max);
    let result = StabilityResult {
        score: 1.0 / (1.0 + mean),
        sensitivity: max / base_count as f64,
        unstable_flags: bucket_flags(&deltas, base_count),
    };
    debug!(
        score = result.score,
        sensitivity = result.sensitivity,
        magnitude,
        "stability analysis complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions_are_unit_and_distinct() {
        let dirs = perturbation_directions();
        assert_eq!(dirs.len(), DIRECTION_COUNT);
        for (i, d) in dirs.iter().enumerate() {
            assert!((d.length() - 1.0).abs() < 1e-12);
            for e in &dirs[i + 1..] {
                assert!(d.angle_to(e) > 0.1);
            }
        }
        assert_eq!(dirs, perturbation_directions());
    }

    #[test]
    fn test_buckets_cover_every_point() {
        assert_eq!(bucket_flags(&[0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 3.0], 2), vec![true, true]);
        let deltas = [0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0];
        assert_eq!(bucket_flags(&deltas, 4), vec![false, false, true, false]);
        // More points than samples: every point still gets a bucket.
        let flags = bucket_flags(&[2.0, 0.0], 5);
        assert_eq!(flags, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_delta_of_one_is_not_unstable() {
        assert_eq!(bucket_flags(&[1.0; 8], 1), vec![false]);
    }
}
