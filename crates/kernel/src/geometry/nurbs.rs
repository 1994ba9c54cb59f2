use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;
use crate::error::KernelError;
use crate::traits::ParametricCurve;

/// A NURBS (Non-Uniform Rational B-Spline) curve in 3D.
///
/// Construction enforces the structural invariants evaluation relies on, so a
/// `NurbsCurve` value can always be evaluated without panicking. Geometric
/// health (finite control points, non-collapsed hull) is reported separately
/// by [`NurbsCurve::check`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "NurbsCurveData", into = "NurbsCurveData")]
pub struct NurbsCurve {
    degree: usize,
    control_points: Vec<Point3d>,
    /// Empty for a non-rational curve.
    weights: Vec<f64>,
    knots: Vec<f64>,
}

/// Unchecked wire form of [`NurbsCurve`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NurbsCurveData {
    degree: usize,
    control_points: Vec<Point3d>,
    #[serde(default)]
    weights: Vec<f64>,
    knots: Vec<f64>,
}

impl TryFrom<NurbsCurveData> for NurbsCurve {
    type Error = KernelError;

    fn try_from(d: NurbsCurveData) -> Result<Self, Self::Error> {
        NurbsCurve::new(d.degree, d.control_points, d.weights, d.knots)
    }
}

impl From<NurbsCurve> for NurbsCurveData {
    fn from(c: NurbsCurve) -> Self {
        Self {
            degree: c.degree,
            control_points: c.control_points,
            weights: c.weights,
            knots: c.knots,
        }
    }
}

impl NurbsCurve {
    pub fn new(
        degree: usize,
        control_points: Vec<Point3d>,
        weights: Vec<f64>,
        knots: Vec<f64>,
    ) -> Result<Self, KernelError> {
        if degree == 0 {
            return Err(KernelError::invalid("NURBS degree must be at least 1"));
        }
        if control_points.len() <= degree {
            return Err(KernelError::invalid(format!(
                "degree {degree} needs at least {} control points, got {}",
                degree + 1,
                control_points.len()
            )));
        }
        if knots.len() != control_points.len() + degree + 1 {
            return Err(KernelError::invalid(format!(
                "knot vector length must be n + p + 1 = {}, got {}",
                control_points.len() + degree + 1,
                knots.len()
            )));
        }
        if !weights.is_empty() && weights.len() != control_points.len() {
            return Err(KernelError::invalid(
                "weights must be empty or match the control point count",
            ));
        }
        if knots.iter().any(|k| !k.is_finite()) || knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(KernelError::invalid("knot vector must be finite and non-decreasing"));
        }
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(KernelError::invalid("weights must be finite and positive"));
        }
        if knots[knots.len() - degree - 1] <= knots[degree] {
            return Err(KernelError::degenerate("NURBS parameter domain is empty"));
        }
        Ok(Self {
            degree,
            control_points,
            weights,
            knots,
        })
    }

    /// Create a non-rational B-spline curve.
    pub fn bspline(
        degree: usize,
        control_points: Vec<Point3d>,
        knots: Vec<f64>,
    ) -> Result<Self, KernelError> {
        Self::new(degree, control_points, vec![], knots)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn control_points(&self) -> &[Point3d] {
        &self.control_points
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    fn weight(&self, i: usize) -> f64 {
        self.weights.get(i).copied().unwrap_or(1.0)
    }

    /// Geometric health check: finite control points and a hull that does
    /// not collapse to a single point.
    pub fn check(&self) -> Result<(), KernelError> {
        if let Some(i) = self.control_points.iter().position(|p| !p.is_finite()) {
            return Err(KernelError::invalid(format!("control point {i} is not finite")));
        }
        let first = self.control_points[0];
        if self
            .control_points
            .iter()
            .all(|p| p.distance_to(&first) < 1e-12)
        {
            return Err(KernelError::degenerate("all control points coincide"));
        }
        Ok(())
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            control_points: self.control_points.iter().map(|p| *p + offset).collect(),
            ..self.clone()
        }
    }

    /// Knot span index containing `t` (binary search).
    fn find_span(&self, t: f64) -> usize {
        let n = self.control_points.len() - 1;
        let p = self.degree;

        if t >= self.knots[n + 1] {
            return n;
        }
        if t <= self.knots[p] {
            return p;
        }

        let mut low = p;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while t < self.knots[mid] || t >= self.knots[mid + 1] {
            if t < self.knots[mid] {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }
        mid
    }

    fn basis_functions(&self, span: usize, t: f64) -> Vec<f64> {
        let p = self.degree;
        let mut n_vals = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];

        n_vals[0] = 1.0;
        for j in 1..=p {
            left[j] = t - self.knots[span + 1 - j];
            right[j] = self.knots[span + j] - t;
            let mut saved = 0.0;
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                let temp = if denom.abs() < 1e-300 { 0.0 } else { n_vals[r] / denom };
                n_vals[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            n_vals[j] = saved;
        }
        n_vals
    }
}

impl ParametricCurve for NurbsCurve {
    fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.knots.len() - self.degree - 1])
    }

    fn evaluate(&self, t: f64) -> Point3d {
        let (t0, t1) = self.domain();
        let t = t.clamp(t0, t1);
        let span = self.find_span(t);
        let basis = self.basis_functions(span, t);
        let p = self.degree;

        let mut acc = Vec3::ZERO;
        let mut w_sum = 0.0;
        for (i, b) in basis.iter().enumerate() {
            let idx = span - p + i;
            let bw = b * self.weight(idx);
            acc = acc + self.control_points[idx].to_vec3() * bw;
            w_sum += bw;
        }
        if w_sum.abs() < 1e-300 {
            return self.control_points[span];
        }
        Point3d::ORIGIN + acc / w_sum
    }

    /// Central finite difference, one-sided at the domain ends.
    fn derivative(&self, t: f64) -> Vec3 {
        let (tmin, tmax) = self.domain();
        let h = (tmax - tmin) * 1e-7;
        let t0 = (t - h).max(tmin);
        let t1 = (t + h).min(tmax);
        if t1 - t0 < 1e-15 {
            return Vec3::ZERO;
        }
        (self.evaluate(t1) - self.evaluate(t0)) / (t1 - t0)
    }
}
