//! The uniform six-channel output and normalization of native results into it.

use geo_kernel::geometry::{Curve, Point3d, Polyline};
use geo_kernel::intersection::mesh::{CurveMeshHit, MeshSection, ProjectionHit};
use geo_kernel::intersection::{
    CurveCurveHit, CurveIntersection, CurveSurfaceHit, RayHit, SurfaceSurfaceHit,
};
use serde::{Deserialize, Serialize};

use crate::context::ExecutionOptions;

/// A parameter on one operand at an intersection point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Param {
    Curve(f64),
    Surface { u: f64, v: f64 },
}

impl Param {
    pub fn as_curve(&self) -> Option<f64> {
        match self {
            Param::Curve(t) => Some(*t),
            Param::Surface { .. } => None,
        }
    }
}

/// Intersection result in one uniform shape.
///
/// `points`, `parameters_a`, `parameters_b` and (when requested)
/// `face_indices` are index-correlated. Parameter channels are filled only
/// when both operands are parametric; otherwise they stay empty. Unused
/// channels are always present and empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntersectionOutput {
    pub points: Vec<Point3d>,
    pub overlap_curves: Vec<Curve>,
    pub parameters_a: Vec<Param>,
    pub parameters_b: Vec<Param>,
    pub face_indices: Vec<usize>,
    pub sections: Vec<Polyline>,
}

impl IntersectionOutput {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
            && self.overlap_curves.is_empty()
            && self.parameters_a.is_empty()
            && self.parameters_b.is_empty()
            && self.face_indices.is_empty()
            && self.sections.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Concatenate `other` channel-wise after `self`.
    pub fn append(&mut self, mut other: IntersectionOutput) {
        self.points.append(&mut other.points);
        self.overlap_curves.append(&mut other.overlap_curves);
        self.parameters_a.append(&mut other.parameters_a);
        self.parameters_b.append(&mut other.parameters_b);
        self.face_indices.append(&mut other.face_indices);
        self.sections.append(&mut other.sections);
    }

    /// Undo an operand swap made during dispatch.
    pub fn swap_operands(&mut self) {
        std::mem::swap(&mut self.parameters_a, &mut self.parameters_b);
    }
}

/// Native result shapes produced by the strategies.
#[derive(Debug, Clone)]
pub enum NativeResult {
    CurveCurve(CurveIntersection<CurveCurveHit>),
    CurveSurface(CurveIntersection<CurveSurfaceHit>),
    SurfaceSurface {
        hits: Vec<SurfaceSurfaceHit>,
        curves: Vec<Curve>,
    },
    Ray(Vec<RayHit>),
    /// Ray hits on a tessellation; parameters are not reported.
    RayMesh(Vec<RayHit>),
    CurveMesh(Vec<CurveMeshHit>),
    Section(MeshSection),
    Projection(Vec<ProjectionHit>),
}

impl NativeResult {
    pub fn into_output(self, opts: &ExecutionOptions) -> IntersectionOutput {
        let mut out = IntersectionOutput::default();
        match self {
            NativeResult::CurveCurve(r) => {
                for h in r.hits {
                    out.points.push(h.point);
                    out.parameters_a.push(Param::Curve(h.t1));
                    out.parameters_b.push(Param::Curve(h.t2));
                }
                out.overlap_curves = r.overlaps;
            }
            NativeResult::CurveSurface(r) => {
                for h in r.hits {
                    out.points.push(h.point);
                    out.parameters_a.push(Param::Curve(h.t));
                    out.parameters_b.push(Param::Surface { u: h.u, v: h.v });
                }
                out.overlap_curves = r.overlaps;
            }
            NativeResult::SurfaceSurface { hits, curves } => {
                for h in hits {
                    out.points.push(h.point);
                    out.parameters_a.push(Param::Surface { u: h.uv1.0, v: h.uv1.1 });
                    out.parameters_b.push(Param::Surface { u: h.uv2.0, v: h.uv2.1 });
                }
                out.overlap_curves = curves;
            }
            NativeResult::Ray(hits) => {
                for h in hits.into_iter().take(opts.max_hits) {
                    out.points.push(h.point);
                    out.parameters_a.push(Param::Curve(h.t));
                    out.parameters_b.push(Param::Surface { u: h.u, v: h.v });
                }
            }
            NativeResult::RayMesh(hits) => {
                for h in hits.into_iter().take(opts.max_hits) {
                    out.points.push(h.point);
                    if opts.with_indices {
                        out.face_indices.extend(h.face);
                    }
                }
            }
            NativeResult::CurveMesh(hits) => {
                for h in hits {
                    out.points.push(h.point);
                    if opts.with_indices {
                        out.face_indices.push(h.face);
                    }
                }
            }
            NativeResult::Section(section) => {
                for s in &section.segments {
                    out.points.push(s.midpoint());
                    if opts.with_indices {
                        out.face_indices.push(s.face_a);
                    }
                }
                out.sections = section.polylines;
            }
            NativeResult::Projection(hits) => {
                for h in hits {
                    out.points.push(h.point);
                    if opts.with_indices {
                        out.face_indices.push(h.face);
                    }
                }
            }
        }
        out
    }
}
