pub mod bbox;
pub mod brep;
pub mod curves;
pub mod mesh;
pub mod nurbs;
pub mod point;
pub mod surfaces;
pub mod vector;

pub use bbox::BoundingBox;
pub use brep::Brep;
pub use curves::{Arc3d, Circle3d, Curve, Ellipse3d, Line3d, Polyline, Ray};
pub use mesh::{Mesh, Tessellation, Triangle};
pub use nurbs::NurbsCurve;
pub use point::Point3d;
pub use surfaces::{Cone, Cylinder, Plane, Sphere, Surface, Torus};
pub use vector::Vec3;
