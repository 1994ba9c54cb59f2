use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A vector in 3D Euclidean space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const X: Self = Self {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };
    pub const Y: Self = Self {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };
    pub const Z: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Unit vector in the same direction, or `None` for (near-)zero or
    /// non-finite input.
    pub fn normalized(&self) -> Option<Self> {
        let len = self.length();
        if !len.is_finite() || len < 1e-15 {
            None
        } else {
            Some(*self / len)
        }
    }

    /// Angle in `[0, PI]` between two vectors. Zero-length input yields 0.
    pub fn angle_to(&self, other: &Self) -> f64 {
        let len_product = self.length() * other.length();
        if len_product < 1e-15 {
            return 0.0;
        }
        (self.dot(other) / len_product).clamp(-1.0, 1.0).acos()
    }

    /// Some unit vector perpendicular to `self`.
    pub fn any_perpendicular(&self) -> Self {
        let helper = if self.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        helper.cross(self).normalized().unwrap_or(Vec3::Y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Self::Output {
        Vec3::new(self * rhs.x, self * rhs.y, self * rhs.z)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_cross_product() {
        let result = Vec3::X.cross(&Vec3::Y);
        assert!((result - Vec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_normalized_rejects_zero() {
        assert!(Vec3::ZERO.normalized().is_none());
        assert!(Vec3::new(f64::NAN, 0.0, 0.0).normalized().is_none());
        let n = Vec3::new(3.0, 0.0, 4.0).normalized().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_angle_to() {
        assert!((Vec3::X.angle_to(&Vec3::Y) - FRAC_PI_2).abs() < 1e-12);
        assert!((Vec3::X.angle_to(&(-Vec3::X)) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_any_perpendicular() {
        for v in [Vec3::X, Vec3::Y, Vec3::Z, Vec3::new(1.0, 2.0, 3.0)] {
            let p = v.any_perpendicular();
            assert!(p.dot(&v).abs() < 1e-12);
            assert!((p.length() - 1.0).abs() < 1e-12);
        }
    }
}
