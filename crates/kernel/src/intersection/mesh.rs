//! Intersections against triangle tessellations: tessellation pairs, planes,
//! curves, rays and point projection.

use tracing::debug;

use crate::Tolerance;
use crate::error::KernelError;
use crate::geometry::bbox::BoundingBox;
use crate::geometry::curves::{Polyline, Ray};
use crate::geometry::mesh::{Tessellation, Triangle};
use crate::geometry::point::Point3d;
use crate::geometry::surfaces::Plane;
use crate::geometry::vector::Vec3;
use crate::traits::ParametricCurve;

use super::{RayHit, bisect, dedupe_by_point};

const CURVE_SEGMENTS: usize = 256;

/// One straight piece of a tessellation intersection, with the source faces
/// it came from (`face_b` is `None` against a plane).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionSegment {
    pub start: Point3d,
    pub end: Point3d,
    pub face_a: usize,
    pub face_b: Option<usize>,
}

impl SectionSegment {
    pub fn midpoint(&self) -> Point3d {
        self.start.midpoint(&self.end)
    }
}

/// Raw segments plus, in accurate mode, the segments chained into polylines.
#[derive(Debug, Clone, Default)]
pub struct MeshSection {
    pub segments: Vec<SectionSegment>,
    pub polylines: Vec<Polyline>,
}

/// Point where a curve passes through a tessellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveMeshHit {
    pub point: Point3d,
    pub t: f64,
    pub face: usize,
}

/// A point projected onto a tessellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionHit {
    pub point: Point3d,
    /// Index of the projected input point.
    pub source: usize,
    pub face: usize,
}

/// Index pairs `(i, j)` of triangles whose boxes overlap, by sweep-and-prune
/// on the x axis.
fn overlapping_pairs(a: &[BoundingBox], b: &[BoundingBox], eps: f64) -> Vec<(usize, usize)> {
    let mut order_b: Vec<usize> = (0..b.len()).collect();
    order_b.sort_by(|&x, &y| b[x].min.x.total_cmp(&b[y].min.x));

    let widest = max_width(b);
    let mut pairs = Vec::new();
    for (i, ba) in a.iter().enumerate() {
        let grown = ba.expanded(eps);
        let start = order_b.partition_point(|&j| b[j].min.x < grown.min.x - widest);
        for &j in &order_b[start..] {
            if b[j].min.x > grown.max.x {
                break;
            }
            if grown.intersects(&b[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

fn max_width(boxes: &[BoundingBox]) -> f64 {
    boxes.iter().map(|bb| bb.max.x - bb.min.x).fold(0.0, f64::max)
}

/// Intersection segment of two triangles, if they cross or touch along a
/// stretch longer than `tol`. Coplanar overlaps are not reported.
pub fn triangle_triangle(a: &Triangle, b: &Triangle, tol: f64) -> Option<(Point3d, Point3d)> {
    let mut pts = Vec::with_capacity(6);
    for (tri, other) in [(a, b), (b, a)] {
        for k in 0..3 {
            let (p0, p1) = (tri.0[k], tri.0[(k + 1) % 3]);
            if let Some(p) = other.segment_hit(&p0, &p1) {
                pts.push(p);
            }
        }
    }
    let pts = dedupe_by_point(pts, tol, |p| *p);
    let mut best: Option<(Point3d, Point3d, f64)> = None;
    for i in 0..pts.len() {
        for j in (i + 1)..pts.len() {
            let d = pts[i].distance_to(&pts[j]);
            if best.is_none_or(|(_, _, bd)| d > bd) {
                best = Some((pts[i], pts[j], d));
            }
        }
    }
    best.filter(|(_, _, d)| *d > tol).map(|(p, q, _)| (p, q))
}

/// Chain segments sharing endpoints (within `tol`) into polylines.
pub fn chain_segments(segments: &[SectionSegment], tol: f64) -> Vec<Polyline> {
    let mut used = vec![false; segments.len()];
    let mut out = Vec::new();
    for seed in 0..segments.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let mut chain = vec![segments[seed].start, segments[seed].end];
        // Grow the tail, then the head.
        for at_tail in [true, false] {
            loop {
                let tip = if at_tail { chain[chain.len() - 1] } else { chain[0] };
                let next = (0..segments.len()).find_map(|k| {
                    if used[k] {
                        return None;
                    }
                    let s = &segments[k];
                    if s.start.distance_to(&tip) <= tol {
                        Some((k, s.end))
                    } else if s.end.distance_to(&tip) <= tol {
                        Some((k, s.start))
                    } else {
                        None
                    }
                });
                let Some((k, p)) = next else { break };
                used[k] = true;
                if at_tail {
                    chain.push(p);
                } else {
                    chain.insert(0, p);
                }
            }
        }
        out.push(Polyline::new(chain));
    }
    out
}

fn finish_section(segments: Vec<SectionSegment>, tol: f64, accurate: bool) -> MeshSection {
    let polylines = if accurate {
        chain_segments(&segments, tol)
    } else {
        segments
            .iter()
            .map(|s| Polyline::new(vec![s.start, s.end]))
            .collect()
    };
    MeshSection { segments, polylines }
}

/// Intersection curves of two tessellations as section segments.
///
/// `accurate` chains the segments into ordered polylines; otherwise every
/// segment is its own two-point polyline.
pub fn tessellation_tessellation(
    a: &Tessellation,
    b: &Tessellation,
    tol: &Tolerance,
    accurate: bool,
) -> MeshSection {
    let boxes_a: Vec<BoundingBox> = a.triangles.iter().map(Triangle::bounding_box).collect();
    let boxes_b: Vec<BoundingBox> = b.triangles.iter().map(Triangle::bounding_box).collect();

    let mut segments = Vec::new();
    for (i, j) in overlapping_pairs(&boxes_a, &boxes_b, tol.coincidence) {
        let (ta, tb) = (&a.triangles[i], &b.triangles[j]);
        if let Some((start, end)) = triangle_triangle(ta, tb, tol.coincidence) {
            segments.push(SectionSegment {
                start,
                end,
                face_a: a.source_faces[i],
                face_b: Some(b.source_faces[j]),
            });
        }
    }
    // Triangles sharing an edge can both report the same piece.
    let segments = dedupe_by_point(segments, tol.coincidence, |s| s.midpoint());
    debug!(segments = segments.len(), accurate, "tessellation-tessellation section");
    finish_section(segments, tol.coincidence, accurate)
}

/// Section of a tessellation by a plane.
pub fn tessellation_plane(
    tess: &Tessellation,
    plane: &Plane,
    tol: &Tolerance,
    accurate: bool,
) -> Result<MeshSection, KernelError> {
    if plane.normal.normalized().is_none() {
        return Err(KernelError::degenerate("plane normal is zero"));
    }
    let mut segments = Vec::new();
    for (tri, face) in tess.iter() {
        let d: Vec<f64> = tri.0.iter().map(|p| plane.distance_to_point(p)).collect();
        let mut pts = Vec::with_capacity(3);
        for k in 0..3 {
            let (da, db) = (d[k], d[(k + 1) % 3]);
            let (pa, pb) = (tri.0[k], tri.0[(k + 1) % 3]);
            if da.abs() <= tol.coincidence {
                pts.push(pa);
            } else if db.abs() > tol.coincidence && (da < 0.0) != (db < 0.0) {
                pts.push(pa.lerp(&pb, da / (da - db)));
            }
        }
        let pts = dedupe_by_point(pts, tol.coincidence, |p| *p);
        if pts.len() == 2 {
            segments.push(SectionSegment {
                start: pts[0],
                end: pts[1],
                face_a: face,
                face_b: None,
            });
        }
    }
    let segments = dedupe_by_point(segments, tol.coincidence, |s| s.midpoint());
    debug!(segments = segments.len(), "tessellation-plane section");
    Ok(finish_section(segments, tol.coincidence, accurate))
}

/// Points where `curve` passes through the tessellation, ordered by `t`.
pub fn curve_tessellation<C: ParametricCurve + ?Sized>(
    curve: &C,
    tess: &Tessellation,
    tol: &Tolerance,
) -> Vec<CurveMeshHit> {
    let samples = curve.sample(CURVE_SEGMENTS + 1);
    let tess_box = tess.bounding_box().expanded(tol.coincidence);
    let mut hits = Vec::new();

    for w in samples.windows(2) {
        let ((t0, p0), (t1, p1)) = (w[0], w[1]);
        let seg_box = BoundingBox::from_points([&p0, &p1]);
        if !seg_box.intersects(&tess_box) {
            continue;
        }
        for (tri, face) in tess.iter() {
            if !seg_box.intersects(&tri.bounding_box().expanded(tol.coincidence)) {
                continue;
            }
            let Some(coarse) = tri.segment_hit(&p0, &p1) else {
                continue;
            };
            hits.push(refine_on_triangle(curve, tri, t0, t1, coarse, face, tol));
        }
    }
    let mut hits = dedupe_by_point(hits, tol.coincidence * 10.0, |h| h.point);
    hits.sort_by(|x, y| x.t.total_cmp(&y.t));
    hits
}

/// Bisect the triangle-plane signed distance on `[t0, t1]`; falls back to
/// the chord hit when the curve does not change side within the bracket.
fn refine_on_triangle<C: ParametricCurve + ?Sized>(
    curve: &C,
    tri: &Triangle,
    t0: f64,
    t1: f64,
    coarse: Point3d,
    face: usize,
    tol: &Tolerance,
) -> CurveMeshHit {
    let chord_t = {
        let span = t1 - t0;
        let (p0, p1) = (curve.evaluate(t0), curve.evaluate(t1));
        let len2 = (p1 - p0).length_squared();
        if len2 > 0.0 {
            t0 + span * ((coarse - p0).dot(&(p1 - p0)) / len2).clamp(0.0, 1.0)
        } else {
            t0
        }
    };
    let Some(n) = tri.normal() else {
        return CurveMeshHit { point: coarse, t: chord_t, face };
    };
    let f = |t: f64| (curve.evaluate(t) - tri.0[0]).dot(&n);
    let (fa, fb) = (f(t0), f(t1));
    if (fa < 0.0) == (fb < 0.0) || fa == 0.0 {
        return CurveMeshHit { point: coarse, t: chord_t, face };
    }
    let t = bisect(f, t0, t1, fa, tol.parametric);
    CurveMeshHit {
        point: curve.evaluate(t),
        t,
        face,
    }
}

/// Forward hits of `ray` on the tessellation, nearest first, at most `max_hits`.
pub fn ray_tessellation(ray: &Ray, tess: &Tessellation, max_hits: usize) -> Vec<RayHit> {
    let mut hits: Vec<RayHit> = tess
        .iter()
        .filter_map(|(tri, face)| {
            let t = tri.line_hit(&ray.origin, &ray.direction)?;
            (t >= 0.0).then(|| RayHit {
                point: ray.at(t),
                t,
                u: 0.0,
                v: 0.0,
                face: Some(face),
            })
        })
        .collect();
    hits.sort_by(|a, b| a.t.total_cmp(&b.t));
    // A ray through a shared edge hits both neighbours.
    hits.dedup_by(|b, a| (b.t - a.t).abs() < 1e-12);
    hits.truncate(max_hits);
    hits
}

/// Project each point along `direction` (either sense) onto the nearest
/// triangle it meets. Points whose line misses the tessellation are dropped.
pub fn project_points(
    points: &[Point3d],
    tess: &Tessellation,
    direction: &Vec3,
) -> Vec<ProjectionHit> {
    points
        .iter()
        .enumerate()
        .filter_map(|(source, p)| {
            tess.iter()
                .filter_map(|(tri, face)| tri.line_hit(p, direction).map(|t| (t, face)))
                .min_by(|a, b| a.0.abs().total_cmp(&b.0.abs()))
                .map(|(t, face)| ProjectionHit {
                    point: *p + *direction * t,
                    source,
                    face,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::curves::{Circle3d, Line3d};

    fn unit_box(offset: Vec3) -> Tessellation {
        Tessellation::from_box(&BoundingBox::new(
            Point3d::ORIGIN + offset,
            Point3d::new(1.0, 1.0, 1.0) + offset,
        ))
    }

    #[test]
    fn test_crossing_triangles_give_segment() {
        let a = Triangle::new(
            Point3d::new(-1.0, -1.0, 0.0),
            Point3d::new(3.0, -1.0, 0.0),
            Point3d::new(-1.0, 3.0, 0.0),
        );
        let b = Triangle::new(
            Point3d::new(0.0, 0.0, -1.0),
            Point3d::new(0.0, 0.0, 1.0),
            Point3d::new(0.0, 1.0, 0.0),
        );
        let (p, q) = triangle_triangle(&a, &b, 1e-9).unwrap();
        assert!(p.z.abs() < 1e-12 && q.z.abs() < 1e-12);
        assert!((p.distance_to(&q) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_box_plane_section_closes_into_one_loop() {
        let tess = unit_box(Vec3::ZERO);
        let plane = Plane::new(Point3d::new(0.0, 0.0, 0.5), Vec3::Z);
        let section = tessellation_plane(&tess, &plane, &Tolerance::default(), true).unwrap();
        assert_eq!(section.polylines.len(), 1);
        let loop_pts = &section.polylines[0].points;
        assert!(loop_pts.first().unwrap().distance_to(loop_pts.last().unwrap()) < 1e-9);
        assert!((section.polylines[0].length() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_fast_mode_keeps_raw_segments() {
        let tess = unit_box(Vec3::ZERO);
        let plane = Plane::new(Point3d::new(0.0, 0.0, 0.5), Vec3::Z);
        let section = tessellation_plane(&tess, &plane, &Tolerance::default(), false).unwrap();
        assert_eq!(section.polylines.len(), section.segments.len());
        assert!(section.polylines.iter().all(|p| p.points.len() == 2));
    }

    #[test]
    fn test_overlapping_boxes_intersect() {
        let a = unit_box(Vec3::ZERO);
        let b = unit_box(Vec3::new(0.5, 0.5, 0.5));
        let section = tessellation_tessellation(&a, &b, &Tolerance::default(), true);
        assert!(!section.segments.is_empty());
        let far = unit_box(Vec3::new(5.0, 0.0, 0.0));
        assert!(tessellation_tessellation(&a, &far, &Tolerance::default(), true)
            .segments
            .is_empty());
    }

    #[test]
    fn test_ray_through_box_hits_two_faces() {
        let tess = unit_box(Vec3::ZERO);
        let ray = Ray::new(Point3d::new(0.3, 0.4, -2.0), Vec3::Z).unwrap();
        let hits = ray_tessellation(&ray, &tess, 16);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].t - 2.0).abs() < 1e-12);
        assert_eq!(hits[0].face, Some(4));
        assert_eq!(ray_tessellation(&ray, &tess, 1).len(), 1);
    }

    #[test]
    fn test_curve_through_box() {
        let tess = unit_box(Vec3::ZERO);
        let line = Line3d::new(Point3d::new(-1.0, 0.5, 0.5), Point3d::new(2.0, 0.5, 0.5));
        let hits = curve_tessellation(&line, &tess, &Tolerance::default());
        assert_eq!(hits.len(), 2);
        assert!(hits[0].point.x.abs() < 1e-9);
        assert!((hits[1].point.x - 1.0).abs() < 1e-9);

        let circle = Circle3d::new(Point3d::new(0.5, 0.5, 0.5), Vec3::Z, 0.6);
        let hits = curve_tessellation(&circle, &tess, &Tolerance::default());
        assert_eq!(hits.len(), 8);
    }

    #[test]
    fn test_project_points_down() {
        let tess = unit_box(Vec3::ZERO);
        let pts = [Point3d::new(0.5, 0.5, 3.0), Point3d::new(9.0, 9.0, 3.0)];
        let hits = project_points(&pts, &tess, &-Vec3::Z);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].point.z - 1.0).abs() < 1e-12);
        assert_eq!(hits[0].source, 0);
    }
}
