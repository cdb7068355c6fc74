use super::TOLERANCE;

/// Axial geometry of the image a structure set is drawn on.
///
/// Only the Z origin and plane spacing are needed to convert between world Z
/// and image-plane indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    /// Z of image plane 0.
    pub origin_z: f64,
    /// Distance between adjacent image planes. Must be positive.
    pub z_res: f64,
}

impl ImageGeometry {
    /// Creates an image geometry from its Z origin and plane spacing.
    #[must_use]
    pub fn new(origin_z: f64, z_res: f64) -> Self {
        Self { origin_z, z_res }
    }

    /// `true` if the plane spacing is finite and positive.
    ///
    /// Geometry failing this cannot map Z to plane indices and is treated as
    /// absent.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.origin_z.is_finite() && self.z_res.is_finite() && self.z_res > TOLERANCE
    }

    /// Index of the image plane nearest to `z`.
    #[must_use]
    pub fn slice_index(&self, z: f64) -> i32 {
        slice_index(z, self.origin_z, self.z_res)
    }

    /// World Z of the given image plane.
    #[must_use]
    pub fn plane_z(&self, plane: i32) -> f64 {
        self.origin_z + f64::from(plane) * self.z_res
    }
}

/// Nearest-plane index for `z`: `floor((z - z0) / z_res + 0.5)`.
///
/// Ties round up. Every Z-to-plane conversion in the crate goes through here.
#[must_use]
pub fn slice_index(z: f64, z0: f64, z_res: f64) -> i32 {
    #[allow(clippy::cast_possible_truncation)]
    let index = ((z - z0) / z_res + 0.5).floor() as i32;
    index
}
