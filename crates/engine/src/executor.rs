//! Runs resolved strategies and aggregates batch results.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::context::{ExecutionOptions, FailurePolicy};
use crate::dispatch::StrategyTable;
use crate::error::{Failure, IntersectError, Outcome};
use crate::output::IntersectionOutput;
use crate::validate;
use crate::value::GeometryValue;

/// Intersect one non-collection pair: resolve, validate, compute, then
/// restore caller operand order.
pub fn execute_pair(
    table: &StrategyTable,
    a: &GeometryValue,
    b: &GeometryValue,
    opts: &ExecutionOptions,
) -> Outcome<IntersectionOutput> {
    let resolved = table.resolve(a.kind(), b.kind())?;
    let strategy = resolved.strategy;

    // Requirements are registered per slot; after a swap the caller's A sits
    // in the strategy's B slot.
    let (req_a, req_b) = if resolved.swapped {
        (strategy.requirement_b, strategy.requirement_a)
    } else {
        (strategy.requirement_a, strategy.requirement_b)
    };
    validate::compose((a, req_a), (b, req_b), &opts.tolerance, opts.failure_policy)?;

    let (first, second) = if resolved.swapped { (b, a) } else { (a, b) };
    let native = (strategy.compute)(first, second, &opts.tolerance, opts).map_err(|source| {
        warn!(strategy = strategy.name, error = %source, "kernel computation failed");
        IntersectError::ComputationFailed {
            strategy: strategy.name,
            source,
        }
    })?;

    let mut out = native.into_output(opts);
    if resolved.swapped {
        out.swap_operands();
    }
    debug!(
        strategy = strategy.name,
        swapped = resolved.swapped,
        points = out.points.len(),
        "pair intersected"
    );
    Ok(out)
}

fn leaves<'v>(value: &'v GeometryValue, out: &mut Vec<&'v GeometryValue>) {
    match value {
        GeometryValue::Collection(items) => items.iter().for_each(|item| leaves(item, out)),
        other => out.push(other),
    }
}

/// Element pairs of a batch call, A-major. Nested collections are flattened.
fn expand<'v>(
    a: &'v GeometryValue,
    b: &'v GeometryValue,
) -> Vec<(&'v GeometryValue, &'v GeometryValue)> {
    let (mut la, mut lb) = (Vec::new(), Vec::new());
    leaves(a, &mut la);
    leaves(b, &mut lb);
    la.iter()
        .flat_map(|x| lb.iter().map(move |y| (*x, *y)))
        .collect()
}

fn run_all(
    table: &StrategyTable,
    pairs: &[(&GeometryValue, &GeometryValue)],
    opts: &ExecutionOptions,
) -> Vec<Outcome<IntersectionOutput>> {
    #[cfg(feature = "parallel")]
    {
        pairs.par_iter().map(|(a, b)| execute_pair(table, a, b, opts)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        pairs.iter().map(|(a, b)| execute_pair(table, a, b, opts)).collect()
    }
}

/// Intersect two operands, expanding collections into per-element pairs.
///
/// Element outputs are concatenated channel-wise in input order. Under
/// fail-fast the first failing element (in input order) ends the call;
/// under accumulate every element runs and all errors are returned together.
pub fn execute(
    table: &StrategyTable,
    a: &GeometryValue,
    b: &GeometryValue,
    opts: &ExecutionOptions,
) -> Outcome<IntersectionOutput> {
    let is_batch =
        matches!(a, GeometryValue::Collection(_)) || matches!(b, GeometryValue::Collection(_));
    if !is_batch {
        return execute_pair(table, a, b, opts);
    }

    let pairs = expand(a, b);
    debug!(elements = pairs.len(), policy = ?opts.failure_policy, "batch intersection");
    let mut merged = IntersectionOutput::default();

    if opts.failure_policy == FailurePolicy::FailFast && !cfg!(feature = "parallel") {
        for (x, y) in pairs {
            merged.append(execute_pair(table, x, y, opts)?);
        }
        return Ok(merged);
    }

    let mut failure: Option<Failure> = None;
    for outcome in run_all(table, &pairs, opts) {
        match outcome {
            Ok(out) => merged.append(out),
            Err(f) if opts.failure_policy == FailurePolicy::FailFast => return Err(f),
            Err(f) => match failure.as_mut() {
                Some(acc) => acc.absorb(f),
                None => failure = Some(f),
            },
        }
    }
    match failure {
        Some(f) => Err(f),
        None => Ok(merged),
    }
}
