use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    pub fn new(min: Point3d, max: Point3d) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3d>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(p);
        }
        bb
    }

    pub fn expand_to_include(&mut self, p: &Point3d) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        out.expand_to_include(&other.min);
        out.expand_to_include(&other.max);
        out
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains_point(&self, p: &Point3d) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn center(&self) -> Point3d {
        self.min.midpoint(&self.max)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the min-max diagonal; zero for an empty box.
    pub fn diagonal(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        self.size().length()
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vec3::new(margin, margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// The eight corners, ordered by the bit pattern `(x, y, z)` of the index.
    pub fn corners(&self) -> [Point3d; 8] {
        let mut out = [Point3d::ORIGIN; 8];
        for (i, corner) in out.iter_mut().enumerate() {
            *corner = Point3d::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        out
    }
}
