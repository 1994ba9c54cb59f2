use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::bbox::BoundingBox;
use super::mesh::{Tessellation, Triangle};
use super::point::Point3d;
use super::vector::Vec3;

/// Polygonal boundary representation: shared vertices and planar faces given
/// as vertex loops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brep {
    pub vertices: Vec<Point3d>,
    pub faces: Vec<Vec<usize>>,
}

/// Undirected edge key, smaller vertex index first.
pub type EdgeKey = (usize, usize);

impl Brep {
    pub fn new(vertices: Vec<Point3d>, faces: Vec<Vec<usize>>) -> Self {
        Self { vertices, faces }
    }

    /// Axis-aligned box solid with outward-wound quads.
    pub fn cuboid(bb: &BoundingBox) -> Self {
        Self::new(
            bb.corners().to_vec(),
            vec![
                vec![0, 4, 6, 2],
                vec![1, 3, 7, 5],
                vec![0, 1, 5, 4],
                vec![2, 6, 7, 3],
                vec![0, 2, 3, 1],
                vec![4, 5, 7, 6],
            ],
        )
    }

    /// Fan triangulation of every face from its first vertex. Faces with
    /// fewer than three valid vertices contribute nothing.
    pub fn tessellation(&self) -> Tessellation {
        let mut out = Tessellation::default();
        for (face_idx, face) in self.faces.iter().enumerate() {
            let Some(verts) = face
                .iter()
                .map(|&i| self.vertices.get(i).copied())
                .collect::<Option<Vec<_>>>()
            else {
                continue;
            };
            if verts.len() < 3 {
                continue;
            }
            for i in 1..verts.len() - 1 {
                out.push(Triangle::new(verts[0], verts[i], verts[i + 1]), face_idx);
            }
        }
        out
    }

    /// Map from each undirected edge to the faces that use it.
    pub fn edge_face_map(&self) -> HashMap<EdgeKey, Vec<usize>> {
        let mut map: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
        for (face_idx, face) in self.faces.iter().enumerate() {
            let n = face.len();
            for i in 0..n {
                let (a, b) = (face[i], face[(i + 1) % n]);
                map.entry((a.min(b), a.max(b))).or_default().push(face_idx);
            }
        }
        map
    }

    /// Edges used by exactly one face (boundary / open shell).
    pub fn free_edges(&self) -> Vec<EdgeKey> {
        let mut out: Vec<EdgeKey> = self
            .edge_face_map()
            .into_iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(k, _)| k)
            .collect();
        out.sort_unstable();
        out
    }

    /// Edges shared by more than two faces.
    pub fn non_manifold_edges(&self) -> Vec<EdgeKey> {
        let mut out: Vec<EdgeKey> = self
            .edge_face_map()
            .into_iter()
            .filter(|(_, faces)| faces.len() > 2)
            .map(|(k, _)| k)
            .collect();
        out.sort_unstable();
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

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Brep {
        Brep::cuboid(&BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0)))
    }

    #[test]
    fn test_cube_is_closed_manifold() {
        let cube = unit_cube();
        assert!(cube.free_edges().is_empty());
        assert!(cube.non_manifold_edges().is_empty());
        assert_eq!(cube.edge_face_map().len(), 12);
    }

    #[test]
    fn test_removed_face_creates_free_edges() {
        let mut cube = unit_cube();
        cube.faces.pop();
        assert_eq!(cube.free_edges().len(), 4);
    }

    #[test]
    fn test_fin_face_is_non_manifold() {
        let mut cube = unit_cube();
        cube.vertices.push(Point3d::new(0.5, -1.0, 0.0));
        cube.faces.push(vec![0, 1, 8]);
        assert_eq!(cube.non_manifold_edges(), vec![(0, 1)]);
    }

    #[test]
    fn test_fan_tessellation_counts() {
        let tess = unit_cube().tessellation();
        assert_eq!(tess.len(), 12);
        assert_eq!(tess.source_faces.iter().filter(|&&f| f == 3).count(), 2);
    }
}
