pub mod bounds;
pub mod ray;
pub mod triangle;

pub use bounds::{Bounds2, Bounds3};
pub use ray::{ray_triangle_intersect, RayHit};
pub use triangle::{triangle_centroid, triangle_normal};

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Absorbs rounding when a normalized texture coordinate is scaled back to
/// whole pixels.
pub const PIXEL_EPSILON: f64 = 1e-6;
