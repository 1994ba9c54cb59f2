//! Polymorphic intersection dispatch and analysis.
//!
//! [`intersect`] resolves a strategy for the runtime kinds of two operands
//! (falling back through each kind's specificity chain and then the swapped
//! pair), validates both operands, runs the native computation and returns a
//! uniform [`IntersectionOutput`]. The analyses in [`analysis`] derive
//! tangency, near-miss and stability diagnostics from that output.

pub mod analysis;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod output;
pub mod validate;
pub mod value;

use tracing::{info, instrument};

pub use analysis::{
    ClassificationKind, ClassificationResult, NearMissResult, StabilityResult, analyze_stability,
    analyze_stability_with, classify, find_near_misses,
};
pub use context::{ExecutionOptions, FailurePolicy, IntersectOptions, ModelContext};
pub use dispatch::{Strategy, StrategyTable};
pub use error::{Failure, IntersectError, Outcome, Slot};
pub use output::{IntersectionOutput, Param};
pub use validate::ValidationRequirement;
pub use value::{Capability, DispatchKey, GeometryKind, GeometryValue};

/// Intersect two operands with the context defaults.
pub fn intersect(
    a: &GeometryValue,
    b: &GeometryValue,
    ctx: &ModelContext,
) -> Outcome<IntersectionOutput> {
    intersect_with(a, b, ctx, &IntersectOptions::default())
}

/// Intersect two operands with caller overrides.
///
/// "No intersection" is a success with every channel empty. Collections
/// are expanded element-wise and their outputs concatenated in input order.
#[instrument(skip(a, b, ctx, options), fields(kind_a = %a.kind(), kind_b = %b.kind()))]
pub fn intersect_with(
    a: &GeometryValue,
    b: &GeometryValue,
    ctx: &ModelContext,
    options: &IntersectOptions,
) -> Outcome<IntersectionOutput> {
    let opts = options.resolve(ctx)?;
    let out = executor::execute(StrategyTable::global(), a, b, &opts)?;
    info!(
        points = out.points.len(),
        overlaps = out.overlap_curves.len(),
        sections = out.sections.len(),
        "intersection complete"
    );
    Ok(out)
}
