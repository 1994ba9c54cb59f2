use std::fmt;

use geo_kernel::KernelError;
use geo_kernel::validation::ErrorCode;
use thiserror::Error;

use crate::value::GeometryKind;

/// Which operand of a pairwise call an error refers to, in caller order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => write!(f, "A"),
            Slot::B => write!(f, "B"),
        }
    }
}

/// A single structured failure from any public operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntersectError {
    #[error("no intersection strategy for {kind_a} x {kind_b}")]
    UnsupportedOperation {
        kind_a: GeometryKind,
        kind_b: GeometryKind,
    },

    #[error("operand {slot} failed {requirement} validation [{code}]: {message}")]
    ValidationFailed {
        slot: Slot,
        requirement: &'static str,
        code: ErrorCode,
        message: String,
    },

    #[error("strategy {strategy} failed: {source}")]
    ComputationFailed {
        strategy: &'static str,
        #[source]
        source: KernelError,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("insufficient data: {reason}")]
    InsufficientData { reason: String },

    #[error("classification failed: {reason}")]
    ClassificationFailed { reason: String },

    #[error("near-miss search failed: {reason}")]
    NearMissSearchFailed { reason: String },
}

impl IntersectError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// One or more errors from a single call. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    errors: Vec<IntersectError>,
}

impl Failure {
    /// Wrap a non-empty error list; `None` for an empty one.
    pub fn from_errors(errors: Vec<IntersectError>) -> Option<Self> {
        (!errors.is_empty()).then_some(Self { errors })
    }

    pub fn first(&self) -> &IntersectError {
        &self.errors[0]
    }

    pub fn errors(&self) -> &[IntersectError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<IntersectError> {
        self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn absorb(&mut self, other: Failure) {
        self.errors.extend(other.errors);
    }
}

impl From<IntersectError> for Failure {
    fn from(error: IntersectError) -> Self {
        Self { errors: vec![error] }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.errors.as_slice() {
            return write!(f, "{only}");
        }
        write!(f, "{} errors:", self.errors.len())?;
        for e in &self.errors {
            write!(f, " [{e}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.first())
    }
}

/// Success payload or one-or-more structured errors.
pub type Outcome<T> = Result<T, Failure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_lists_every_error() {
        let mut f = Failure::from(IntersectError::InsufficientData {
            reason: "no points".into(),
        });
        let bad_hits = IntersectError::invalid_parameter("max_hits", "must be at least 1");
        f.absorb(Failure::from(bad_hits));
        assert_eq!(f.error_count(), 2);
        let text = f.to_string();
        assert!(text.starts_with("2 errors:"));
        assert!(text.contains("max_hits"));
    }

    #[test]
    fn test_empty_error_list_is_not_a_failure() {
        assert!(Failure::from_errors(Vec::new()).is_none());
    }
}
