//! Mesh and B-rep health: dangling indices, degenerate faces, free and
//! non-manifold edges.

use tracing::{debug, instrument};

use crate::Tolerance;
use crate::geometry::brep::Brep;
use crate::geometry::mesh::Mesh;
use crate::geometry::vector::Vec3;

use super::geometry::finite_points;
use super::types::{ErrorCode, Finding};

/// Triangle-mesh checks: emptiness, out-of-range indices, repeated vertices
/// and zero-area triangles.
#[instrument(skip_all, fields(vertices = mesh.vertex_count(), faces = mesh.triangle_count()))]
pub fn mesh_checks(mesh: &Mesh, tol: &Tolerance) -> Vec<Finding> {
    let mut out = Vec::new();
    if mesh.vertices.is_empty() || mesh.faces.is_empty() {
        out.push(Finding::new(ErrorCode::EmptyGeometry, "mesh has no vertices or no faces"));
        return out;
    }
    out.extend(finite_points(&mesh.vertices));

    let area_tol = tol.coincidence * tol.coincidence;
    for (i, face) in mesh.faces.iter().enumerate() {
        if face.iter().any(|&v| v >= mesh.vertices.len()) {
            out.push(Finding::new(
                ErrorCode::DanglingReference,
                format!("face {i} references a missing vertex"),
            ));
            continue;
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            out.push(Finding::new(ErrorCode::DegenerateFace, format!("face {i} repeats a vertex")));
            continue;
        }
        if let Some(tri) = mesh.triangle(i) {
            let area = tri.area();
            if area <= area_tol {
                out.push(Finding::measured(
                    ErrorCode::ZeroAreaFace,
                    format!("face {i} has zero area"),
                    area,
                    area_tol,
                ));
            }
        }
    }
    debug!(findings = out.len(), "mesh checks complete");
    out
}

/// Closed-manifold checks for a polygonal B-rep: every edge must be shared
/// by exactly two faces.
#[instrument(skip_all, fields(vertices = brep.vertices.len(), faces = brep.faces.len()))]
pub fn brep_topology(brep: &Brep) -> Vec<Finding> {
    let mut out = Vec::new();
    if brep.vertices.is_empty() || brep.faces.is_empty() {
        out.push(Finding::new(ErrorCode::EmptyGeometry, "B-rep has no vertices or no faces"));
        return out;
    }
    for (i, face) in brep.faces.iter().enumerate() {
        if face.len() < 3 {
            out.push(Finding::new(
                ErrorCode::DegenerateFace,
                format!("face {i} has {} vertices", face.len()),
            ));
        }
        if face.iter().any(|&v| v >= brep.vertices.len()) {
            out.push(Finding::new(
                ErrorCode::DanglingReference,
                format!("face {i} references a missing vertex"),
            ));
        }
    }
    for (a, b) in brep.free_edges() {
        out.push(Finding::new(
            ErrorCode::FreeEdge,
            format!("edge ({a}, {b}) is referenced by only one face (open boundary)"),
        ));
    }
    let edge_faces = brep.edge_face_map();
    for key in brep.non_manifold_edges() {
        let count = edge_faces.get(&key).map_or(0, Vec::len);
        out.push(Finding::measured(
            ErrorCode::InvalidMultiConnexity,
            format!("edge ({}, {}) shared by {count} faces (expected 2)", key.0, key.1),
            count as f64,
            2.0,
        ));
    }
    debug!(findings = out.len(), "B-rep topology checks complete");
    out
}

/// Degenerate polygon faces of a B-rep (zero area by the Newell normal).
pub fn brep_degeneracy(brep: &Brep, tol: &Tolerance) -> Vec<Finding> {
    let mut out = finite_points(&brep.vertices);
    let area_tol = tol.coincidence * tol.coincidence;
    for (i, face) in brep.faces.iter().enumerate() {
        let Some(pts) = face
            .iter()
            .map(|&v| brep.vertices.get(v).copied())
            .collect::<Option<Vec<_>>>()
        else {
            continue;
        };
        if pts.len() < 3 {
            continue;
        }
        let area = 0.5
            * (0..pts.len())
                .map(|k| pts[k].to_vec3().cross(&pts[(k + 1) % pts.len()].to_vec3()))
                .fold(Vec3::ZERO, |acc, v| acc + v)
                .length();
        if area <= area_tol {
            out.push(Finding::measured(
                ErrorCode::ZeroAreaFace,
                format!("face {i} has zero area"),
                area,
                area_tol,
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::bbox::BoundingBox;
    use crate::geometry::point::Point3d;

    fn cube() -> Brep {
        Brep::cuboid(&BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0)))
    }

    #[test]
    fn test_cube_is_clean() {
        assert!(brep_topology(&cube()).is_empty());
        assert!(brep_degeneracy(&cube(), &Tolerance::default()).is_empty());
    }

    #[test]
    fn test_open_box_reports_free_edges() {
        let mut open = cube();
        open.faces.pop();
        let findings = brep_topology(&open);
        assert_eq!(findings.len(), 4);
        assert!(findings.iter().all(|f| f.code == ErrorCode::FreeEdge));
    }

    #[test]
    fn test_mesh_dangling_and_zero_area() {
        let mesh = Mesh::new(
            vec![
                Point3d::ORIGIN,
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(2.0, 0.0, 0.0),
                Point3d::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 3], [0, 1, 2], [0, 1, 7]],
        );
        let codes: Vec<ErrorCode> = mesh_checks(&mesh, &Tolerance::default())
            .iter()
            .map(|f| f.code)
            .collect();
        assert_eq!(codes, vec![ErrorCode::ZeroAreaFace, ErrorCode::DanglingReference]);
    }

    #[test]
    fn test_empty_mesh() {
        let f = mesh_checks(&Mesh::default(), &Tolerance::default());
        assert_eq!(f[0].code, ErrorCode::EmptyGeometry);
    }
}
