pub mod clip_2d;
pub mod plane;
pub mod polygon_2d;
pub mod polygon_3d;
pub mod transform;
pub mod triangulate;

pub use plane::Plane;
pub use transform::Transformation;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// 3x3 rotation matrix.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Coarse overlap tolerance for surface matching and clipping, in meters (1 cm).
///
/// Domain-sized construction tolerance, not a floating-point epsilon: two
/// surfaces closer than this are "touching".
pub const INTERSECT_TOL: f64 = 0.01;

/// Edge inset/outset distance for sub-surface masks and glazing margins,
/// in meters (1 inch).
pub const EDGE_GAP: f64 = 0.0254;

/// Tolerance for post-clip polygon area audits, in square meters (10 cm2).
pub const AREA_TOL: f64 = 0.001;
