//! Specificity-chain search with symmetric fallback.
//!
//! For operands of kinds `A` and `B` the registered pairs are searched as
//! `chain(A)[i] x chain(B)[j]` with `i` in the outer loop: every
//! generalization of `B` is tried before `A` is generalized. So with
//! `Line x Circle`, a `Line x Curve` registration beats `Curve x Circle`.
//! If nothing matches, the search repeats with the operands exchanged and
//! the match is marked swapped.

use crate::value::{DispatchKey, GeometryKind};

use super::Strategy;

/// A resolved strategy index and whether operands must be exchanged
/// before calling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub index: usize,
    pub swapped: bool,
}

fn nested_search(strategies: &[Strategy], a: &[DispatchKey], b: &[DispatchKey]) -> Option<usize> {
    a.iter()
        .flat_map(|ka| b.iter().map(move |kb| (*ka, *kb)))
        .find_map(|(ka, kb)| strategies.iter().position(|s| s.matches(ka, kb)))
}

/// First matching strategy for the ordered kind pair `(a, b)`.
pub fn resolve_in(strategies: &[Strategy], a: GeometryKind, b: GeometryKind) -> Option<Resolution> {
    let chain_a = a.specificity_chain();
    let chain_b = b.specificity_chain();
    if let Some(index) = nested_search(strategies, chain_a, chain_b) {
        return Some(Resolution { index, swapped: false });
    }
    nested_search(strategies, chain_b, chain_a).map(|index| Resolution { index, swapped: true })
}
