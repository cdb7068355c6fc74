pub mod bounds;
pub mod image_geometry;
pub mod polygon_2d;

pub use bounds::Aabb;
pub use image_geometry::{slice_index, ImageGeometry};

/// 3D point type, in the host imaging geometry's units (millimeters).
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;
