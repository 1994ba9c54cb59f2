use serde::{Deserialize, Serialize};

use super::bbox::BoundingBox;
use super::point::Point3d;
use super::vector::Vec3;

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3d>,
    pub faces: Vec<[usize; 3]>,
}

/// A single triangle by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle(pub [Point3d; 3]);

/// Triangles plus, for each triangle, the index of the face it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tessellation {
    pub triangles: Vec<Triangle>,
    pub source_faces: Vec<usize>,
}

impl Mesh {
    pub fn new(vertices: Vec<Point3d>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    /// Triangle for face `i`, `None` if any index is out of range.
    pub fn triangle(&self, i: usize) -> Option<Triangle> {
        let [a, b, c] = *self.faces.get(i)?;
        Some(Triangle([
            *self.vertices.get(a)?,
            *self.vertices.get(b)?,
            *self.vertices.get(c)?,
        ]))
    }

    /// Faces with out-of-range indices are skipped; validation reports them.
    pub fn tessellation(&self) -> Tessellation {
        let mut out = Tessellation::default();
        for i in 0..self.faces.len() {
            if let Some(tri) = self.triangle(i) {
                out.push(tri, i);
            }
        }
        out
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            vertices: self.vertices.iter().map(|p| *p + offset).collect(),
            faces: self.faces.clone(),
        }
    }
}

impl Triangle {
    pub fn new(a: Point3d, b: Point3d, c: Point3d) -> Self {
        Self([a, b, c])
    }

    /// Unnormalized normal, `(b - a) x (c - a)`.
    pub fn raw_normal(&self) -> Vec3 {
        let [a, b, c] = self.0;
        (b - a).cross(&(c - a))
    }

    pub fn normal(&self) -> Option<Vec3> {
        self.raw_normal().normalized()
    }

    pub fn area(&self) -> f64 {
        0.5 * self.raw_normal().length()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.0)
    }

    pub fn centroid(&self) -> Point3d {
        let [a, b, c] = self.0;
        Point3d::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0, (a.z + b.z + c.z) / 3.0)
    }

    /// Moller-Trumbore: ray parameter `t` along `dir` where the line
    /// `origin + t * dir` crosses the triangle, or `None` when parallel or
    /// outside. `t` is not range-restricted.
    pub fn line_hit(&self, origin: &Point3d, dir: &Vec3) -> Option<f64> {
        let [p0, p1, p2] = self.0;
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let h = dir.cross(&e2);
        let det = e1.dot(&h);
        if det.abs() < 1e-14 {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = *origin - p0;
        let u = inv_det * s.dot(&h);
        if !(-1e-12..=1.0 + 1e-12).contains(&u) {
            return None;
        }
        let q = s.cross(&e1);
        let v = inv_det * dir.dot(&q);
        if v < -1e-12 || u + v > 1.0 + 1e-12 {
            return None;
        }
        Some(inv_det * e2.dot(&q))
    }

    /// Point where segment `p0 -> p1` crosses the triangle, inclusive of the
    /// segment ends.
    pub fn segment_hit(&self, p0: &Point3d, p1: &Point3d) -> Option<Point3d> {
        let dir = *p1 - *p0;
        let t = self.line_hit(p0, &dir)?;
        (-1e-12..=1.0 + 1e-12)
            .contains(&t)
            .then(|| p0.lerp(p1, t.clamp(0.0, 1.0)))
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        let [a, b, c] = self.0;
        Self([a + offset, b + offset, c + offset])
    }
}

impl Tessellation {
    pub fn push(&mut self, tri: Triangle, source_face: usize) {
        self.triangles.push(tri);
        self.source_faces.push(source_face);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Triangle, usize)> {
        self.triangles.iter().zip(self.source_faces.iter().copied())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.triangles
            .iter()
            .fold(BoundingBox::empty(), |acc, t| acc.union(&t.bounding_box()))
    }

    /// Twelve triangles covering the six faces of a box. Source face indices
    /// are `0..6` in the order -x, +x, -y, +y, -z, +z.
    pub fn from_box(bb: &BoundingBox) -> Self {
        let c = bb.corners();
        // Corner index bits: 1 = +x, 2 = +y, 4 = +z. Quads wound outward.
        const QUADS: [[usize; 4]; 6] = [
            [0, 4, 6, 2],
            [1, 3, 7, 5],
            [0, 1, 5, 4],
            [2, 6, 7, 3],
            [0, 2, 3, 1],
            [4, 5, 7, 6],
        ];
        let mut out = Self::default();
        for (face, q) in QUADS.iter().enumerate() {
            out.push(Triangle::new(c[q[0]], c[q[1]], c[q[2]]), face);
            out.push(Triangle::new(c[q[0]], c[q[2]], c[q[3]]), face);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Point3d::ORIGIN,
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_triangle_area_and_normal() {
        let t = unit_triangle();
        assert!((t.area() - 0.5).abs() < 1e-12);
        assert!((t.normal().unwrap() - Vec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_segment_hit_inside_and_outside() {
        let t = unit_triangle();
        let hit = t
            .segment_hit(&Point3d::new(0.25, 0.25, -1.0), &Point3d::new(0.25, 0.25, 1.0))
            .unwrap();
        assert!(hit.z.abs() < 1e-12);
        assert!(t
            .segment_hit(&Point3d::new(2.0, 2.0, -1.0), &Point3d::new(2.0, 2.0, 1.0))
            .is_none());
        assert!(t
            .segment_hit(&Point3d::new(0.25, 0.25, 0.5), &Point3d::new(0.25, 0.25, 1.0))
            .is_none());
    }

    #[test]
    fn test_out_of_range_faces_are_skipped() {
        let mesh = Mesh::new(
            vec![Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0), Point3d::new(0.0, 1.0, 0.0)],
            vec![[0, 1, 2], [0, 1, 9]],
        );
        let tess = mesh.tessellation();
        assert_eq!(tess.len(), 1);
        assert_eq!(tess.source_faces, vec![0]);
    }

    #[test]
    fn test_box_tessellation_is_closed_and_outward() {
        let bb = BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 2.0, 3.0));
        let tess = Tessellation::from_box(&bb);
        assert_eq!(tess.len(), 12);
        let total: f64 = tess.triangles.iter().map(Triangle::area).sum();
        assert!((total - 2.0 * (2.0 + 3.0 + 6.0)).abs() < 1e-12);
        let center = bb.center();
        for tri in &tess.triangles {
            let outward = tri.centroid() - center;
            assert!(tri.raw_normal().dot(&outward) > 0.0);
        }
    }
}
