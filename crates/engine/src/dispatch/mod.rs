//! Strategy registry and the kind-pair resolver.

pub mod resolver;
pub mod strategies;
pub mod table;

use std::fmt;

use geo_kernel::{KernelError, Tolerance};

use crate::context::ExecutionOptions;
use crate::output::NativeResult;
use crate::validate::ValidationRequirement;
use crate::value::{DispatchKey, GeometryValue};

pub use resolver::{Resolution, resolve_in};
pub use table::{Resolved, StrategyTable};

/// Native computation for one registered pair. Operands arrive in
/// registered order.
pub type ComputeFn = fn(
    &GeometryValue,
    &GeometryValue,
    &Tolerance,
    &ExecutionOptions,
) -> Result<NativeResult, KernelError>;

/// Computation plus per-slot validation for one registered kind pair.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub key_a: DispatchKey,
    pub key_b: DispatchKey,
    pub compute: ComputeFn,
    pub requirement_a: ValidationRequirement,
    pub requirement_b: ValidationRequirement,
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("key_a", &self.key_a)
            .field("key_b", &self.key_b)
            .field("requirement_a", &self.requirement_a)
            .field("requirement_b", &self.requirement_b)
            .finish()
    }
}

impl Strategy {
    pub fn matches(&self, a: DispatchKey, b: DispatchKey) -> bool {
        self.key_a == a && self.key_b == b
    }
}
