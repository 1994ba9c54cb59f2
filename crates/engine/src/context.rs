//! Context defaults, per-call overrides and the options resolved from both.

use geo_kernel::Tolerance;
use geo_kernel::geometry::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::IntersectError;

pub const DEFAULT_MAX_HITS: usize = 16;

/// Document/session defaults consulted once per call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelContext {
    /// Distance below which points coincide, in model units.
    pub absolute_tolerance: f64,
    /// Angle below which directions coincide, in radians.
    pub angular_tolerance: f64,
    /// Length of one model unit in meters.
    pub unit_scale: f64,
}

impl Default for ModelContext {
    fn default() -> Self {
        Self {
            absolute_tolerance: 1e-6,
            angular_tolerance: 1e-10,
            unit_scale: 1.0,
        }
    }
}

impl ModelContext {
    /// Millimeter documents: one micron tolerance.
    pub fn millimeters() -> Self {
        Self {
            absolute_tolerance: 1e-3,
            unit_scale: 1e-3,
            ..Self::default()
        }
    }

    /// Meter documents: one micron tolerance.
    pub fn meters() -> Self {
        Self::default()
    }

    /// Parse a context from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, IntersectError> {
        let ctx: Self = serde_json::from_str(json)
            .map_err(|e| IntersectError::invalid_parameter("context", e.to_string()))?;
        ctx.validate()?;
        Ok(ctx)
    }

    pub fn validate(&self) -> Result<(), IntersectError> {
        positive("absolute_tolerance", self.absolute_tolerance)?;
        positive("angular_tolerance", self.angular_tolerance)?;
        positive("unit_scale", self.unit_scale)
    }

    /// Kernel tolerance for this context.
    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            coincidence: self.absolute_tolerance,
            angular: self.angular_tolerance,
            ..Tolerance::default()
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), IntersectError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(IntersectError::invalid_parameter(
            name,
            format!("must be finite and positive, got {value}"),
        ))
    }
}

/// What a batch call does when one element fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop at the first error.
    #[default]
    FailFast,
    /// Run everything and report every error.
    Accumulate,
}

/// Caller overrides for one `intersect` call. Unset fields fall back to the
/// context or the engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectOptions {
    pub tolerance: Option<f64>,
    /// Direction for point-projection pairs.
    pub projection_direction: Option<Vec3>,
    /// Hit cap for ray-shooting pairs.
    pub max_hits: Option<usize>,
    /// Fill the face-index channel with provenance.
    pub with_indices: bool,
    /// Prefer the accurate kernel variant over the fast one.
    pub sorted: bool,
    pub failure_policy: FailurePolicy,
}

impl IntersectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_projection_direction(mut self, direction: Vec3) -> Self {
        self.projection_direction = Some(direction);
        self
    }

    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.max_hits = Some(max_hits);
        self
    }

    pub fn with_indices(mut self, with_indices: bool) -> Self {
        self.with_indices = with_indices;
        self
    }

    pub fn with_sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Merge with the context defaults and check every value.
    pub fn resolve(&self, ctx: &ModelContext) -> Result<ExecutionOptions, IntersectError> {
        ctx.validate()?;
        let mut tolerance = ctx.tolerance();
        if let Some(t) = self.tolerance {
            positive("tolerance", t)?;
            tolerance.coincidence = t;
        }

        let max_hits = self.max_hits.unwrap_or(DEFAULT_MAX_HITS);
        if max_hits == 0 {
            return Err(IntersectError::invalid_parameter("max_hits", "must be at least 1"));
        }

        let projection_direction = match self.projection_direction {
            None => -Vec3::Z,
            Some(d) => d
                .is_finite()
                .then(|| d.normalized())
                .flatten()
                .ok_or_else(|| {
                    IntersectError::invalid_parameter(
                        "projection_direction",
                        "must be finite and non-zero",
                    )
                })?,
        };

        Ok(ExecutionOptions {
            tolerance,
            sorted: self.sorted,
            projection_direction,
            max_hits,
            with_indices: self.with_indices,
            failure_policy: self.failure_policy,
        })
    }
}

/// Fully resolved per-call settings handed to every strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionOptions {
    pub tolerance: Tolerance,
    pub sorted: bool,
    /// Unit projection direction.
    pub projection_direction: Vec3,
    pub max_hits: usize,
    pub with_indices: bool,
    pub failure_policy: FailurePolicy,
}

impl ExecutionOptions {
    /// Context defaults with no caller overrides.
    pub fn from_context(ctx: &ModelContext) -> Result<Self, IntersectError> {
        IntersectOptions::default().resolve(ctx)
    }
}
