//! Diagnostics derived from a computed intersection and its operands.

pub mod classify;
pub mod near_miss;
pub mod stability;

pub use classify::{ClassificationKind, ClassificationResult, classify};
pub use near_miss::{NearMissResult, find_near_misses};
pub use stability::{
    StabilityResult, analyze_stability, analyze_stability_with, perturbation_directions,
};
