use thiserror::Error;

/// Failure signals from native kernel computations.
///
/// "No intersection" is never an error: routines return an empty hit list for
/// that. These variants mean the computation itself could not be carried out.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error("degenerate geometry: {reason}")]
    Degenerate { reason: String },

    #[error("iteration did not converge after {iterations} steps (residual: {residual:.3e})")]
    NotConverged { iterations: usize, residual: f64 },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("operation not supported: {operation}")]
    Unsupported { operation: String },
}

impl KernelError {
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::Degenerate {
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}
