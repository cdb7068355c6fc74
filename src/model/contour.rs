use std::fmt;

use crate::error::{GeometryError, Result};
use crate::math::Point3;

/// Delimiter used by the default textual form of a contour.
pub const DEFAULT_POINT_DELIMITER: &str = " | ";

/// One closed polygon on a single axial plane.
///
/// Points are kept in boundary order. All points share the Z of the first
/// point; the sequence is never exposed mutably, so that holds for the life
/// of the contour.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<Point3>,
}

impl Contour {
    /// Creates a contour from an ordered point sequence.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyContour`] if `points` is empty.
    pub fn new(points: Vec<Point3>) -> Result<Self> {
        if points.is_empty() {
            return Err(GeometryError::EmptyContour.into());
        }
        Ok(Self { points })
    }

    /// Creates a contour by copying a point slice.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyContour`] if `points` is empty.
    pub fn from_slice(points: &[Point3]) -> Result<Self> {
        Self::new(points.to_vec())
    }

    /// Z of the plane this contour lies on.
    #[must_use]
    pub fn z_location(&self) -> f64 {
        self.points[0].z
    }

    /// The points in boundary order, as handed to the structure store.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// An owned copy of the points in boundary order.
    #[must_use]
    pub fn copy_points(&self) -> Vec<Point3> {
        self.points.clone()
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// An independent contour with the same point values.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        Self {
            points: self.points.clone(),
        }
    }

    /// Formats every point as `x, y` with two decimals, joined by `delimiter`.
    ///
    /// Intended for reports, not for parsing back.
    #[must_use]
    pub fn render(&self, delimiter: &str) -> String {
        self.points
            .iter()
            .map(|p| format!("{}, {}", fixed2(p.x), fixed2(p.y)))
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

/// Two-decimal fixed format; exact ties round away from zero.
pub(crate) fn fixed2(value: f64) -> String {
    // only multiples of 1/8 can land exactly on a half hundredth
    #[allow(clippy::float_cmp)]
    let exact_eighth = (value * 8.0).fract() == 0.0;
    if exact_eighth {
        format!("{:.2}", (value * 100.0).round() / 100.0)
    } else {
        format!("{value:.2}")
    }
}

impl fmt::Display for Contour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_POINT_DELIMITER))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RtStructError;

    fn triangle(z: f64) -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(10.5, 0.0, z),
            Point3::new(0.0, -3.126, z),
        ]
    }

    #[test]
    fn z_location_is_first_point_z() {
        let c = Contour::new(triangle(-42.5)).unwrap();
        assert!((c.z_location() + 42.5).abs() < 1e-12);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = Contour::new(Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            RtStructError::Geometry(GeometryError::EmptyContour)
        ));
    }

    #[test]
    fn points_preserve_order() {
        let pts = triangle(1.0);
        let c = Contour::from_slice(&pts).unwrap();
        assert_eq!(c.points(), pts.as_slice());
        assert_eq!(c.copy_points(), pts);
    }

    #[test]
    fn deep_copy_is_independent() {
        let original = Contour::new(triangle(5.0)).unwrap();
        let copy = original.deep_copy();
        assert_eq!(copy, original);

        let mut moved = copy.copy_points();
        moved[0].x = 99.0;
        let changed = Contour::new(moved).unwrap();
        assert_ne!(changed, original);
        assert!((original.points()[0].x).abs() < 1e-12);
    }

    #[test]
    fn exact_ties_round_away_from_zero() {
        let c = Contour::new(vec![
            Point3::new(0.125, -0.375, 1.0),
            Point3::new(2.675, 10.0, 1.0),
        ])
        .unwrap();
        assert_eq!(c.render(" | "), "0.13, -0.38 | 2.67, 10.00");
        assert_eq!(fixed2(-12.5), "-12.50");
    }

    #[test]
    fn render_uses_two_decimals() {
        let c = Contour::new(triangle(0.0)).unwrap();
        assert_eq!(c.render(","), "0.00, 0.00,10.50, 0.00,0.00, -3.13");
        assert_eq!(
            c.to_string(),
            "0.00, 0.00 | 10.50, 0.00 | 0.00, -3.13"
        );
    }
}
