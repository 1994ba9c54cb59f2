use std::sync::OnceLock;

use tracing::debug;

use crate::error::IntersectError;
use crate::value::GeometryKind;

use super::resolver::{Resolution, resolve_in};
use super::strategies::STRATEGIES;
use super::Strategy;

const KIND_COUNT: usize = GeometryKind::ALL.len();

/// Immutable registry of strategies with every ordered kind pair resolved
/// up front.
pub struct StrategyTable {
    strategies: Vec<Strategy>,
    resolved: Vec<Option<Resolution>>,
}

/// A strategy chosen for a call, borrowed from its table.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'t> {
    pub strategy: &'t Strategy,
    pub swapped: bool,
}

static GLOBAL: OnceLock<StrategyTable> = OnceLock::new();

impl StrategyTable {
    /// Build a table from a declarative strategy list.
    pub fn new(strategies: Vec<Strategy>) -> Self {
        let mut resolved = Vec::with_capacity(KIND_COUNT * KIND_COUNT);
        for a in GeometryKind::ALL {
            for b in GeometryKind::ALL {
                resolved.push(resolve_in(&strategies, a, b));
            }
        }
        debug!(
            strategies = strategies.len(),
            resolved_pairs = resolved.iter().filter(|r| r.is_some()).count(),
            "strategy table built"
        );
        Self { strategies, resolved }
    }

    /// The process-wide table over the built-in strategy list.
    pub fn global() -> &'static StrategyTable {
        GLOBAL.get_or_init(|| StrategyTable::new(STRATEGIES.to_vec()))
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn lookup(&self, a: GeometryKind, b: GeometryKind) -> Option<Resolved<'_>> {
        let r = self.resolved[a.index() * KIND_COUNT + b.index()]?;
        Some(Resolved {
            strategy: &self.strategies[r.index],
            swapped: r.swapped,
        })
    }

    pub fn resolve(
        &self,
        a: GeometryKind,
        b: GeometryKind,
    ) -> Result<Resolved<'_>, IntersectError> {
        self.lookup(a, b).ok_or(IntersectError::UnsupportedOperation { kind_a: a, kind_b: b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DispatchKey, GeometryKind as K};

    #[test]
    fn test_global_table_is_shared() {
        let a = StrategyTable::global() as *const StrategyTable;
        let b = StrategyTable::global() as *const StrategyTable;
        assert_eq!(a, b);
    }

    #[test]
    fn test_unsupported_pair_names_both_kinds() {
        let err = StrategyTable::global().resolve(K::Plane, K::Plane).unwrap_err();
        assert_eq!(
            err,
            IntersectError::UnsupportedOperation {
                kind_a: K::Plane,
                kind_b: K::Plane
            }
        );
        assert!(err.to_string().contains("Plane x Plane"));
    }

    #[test]
    fn test_outer_chain_generalizes_last() {
        // Both Line x Curve and Curve x Circle would fit Line x Circle; the
        // outer loop keeps Line fixed while Circle is generalized.
        let pick = |name: &str| {
            STRATEGIES
                .iter()
                .find(|s| s.name == name)
                .copied()
                .unwrap()
        };
        let mut line_curve = pick("Curve x Curve");
        line_curve.name = "Line x Curve";
        line_curve.key_a = DispatchKey::Kind(K::Line);
        let mut curve_circle = pick("Curve x Curve");
        curve_circle.name = "Curve x Circle";
        curve_circle.key_b = DispatchKey::Kind(K::Circle);

        let table = StrategyTable::new(vec![curve_circle, line_curve]);
        let r = table.lookup(K::Line, K::Circle).unwrap();
        assert_eq!(r.strategy.name, "Line x Curve");
        assert!(!r.swapped);
        // Reversed, nothing matches directly and the swapped search again
        // keeps Line fixed first.
        let r = table.lookup(K::Circle, K::Line).unwrap();
        assert_eq!(r.strategy.name, "Line x Curve");
        assert!(r.swapped);
    }
}
