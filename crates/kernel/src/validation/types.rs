//! Finding and error-code types shared by the geometric-health predicates.

use std::fmt;

/// Enumeration of all validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // --- Degeneracy ---
    /// Curve has zero or near-zero length.
    ZeroLengthCurve,
    /// Circle, arc, sphere or cylinder radius is at or below tolerance.
    ZeroRadius,
    /// Arc sweep is zero, negative or exceeds a full turn.
    InvalidSweep,
    /// Plane normal, axis or ray direction has zero length.
    ZeroDirection,
    /// Cylinder or cone height is at or below tolerance.
    ZeroHeight,
    // --- NURBS ---
    /// NURBS control hull collapses to a point or holds non-finite data.
    InvalidNurbsData,
    // --- Parameter domain ---
    /// Parameter domain is empty, reversed or non-finite.
    InvalidDomain,
    // --- Finite ---
    /// A coordinate is NaN or infinite.
    NonFiniteCoordinate,
    // --- Mesh / topology ---
    /// Mesh or B-rep has no vertices or faces.
    EmptyGeometry,
    /// A face references a vertex index that does not exist.
    DanglingReference,
    /// Face has zero or near-zero area.
    ZeroAreaFace,
    /// Face repeats a vertex or has fewer than three vertices.
    DegenerateFace,
    /// Edge is referenced by only one face (open boundary).
    FreeEdge,
    /// Edge is shared by more than two faces (non-manifold).
    InvalidMultiConnexity,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single violated predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Measured numeric value (e.g. the length of a degenerate curve).
    pub numeric_value: Option<f64>,
    /// The tolerance threshold that was exceeded.
    pub tolerance: Option<f64>,
}

impl Finding {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            numeric_value: None,
            tolerance: None,
        }
    }

    pub fn measured(
        code: ErrorCode,
        message: impl Into<String>,
        value: f64,
        tolerance: f64,
    ) -> Self {
        Self {
            numeric_value: Some(value),
            tolerance: Some(tolerance),
            ..Self::new(code, message)
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if let Some(val) = self.numeric_value {
            write!(f, " value={val:.2e}")?;
        }
        if let Some(tol) = self.tolerance {
            write!(f, " tol={tol:.2e}")?;
        }
        Ok(())
    }
}
