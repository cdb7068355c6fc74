use std::fmt;
use std::fmt::Write as _;

use super::Contour;
use crate::error::{GeometryError, Result};
use crate::math::Point3;

/// The contours of one structure on one image plane.
///
/// Contours keep their insertion order. Only the owning
/// [`StructureModel`](super::StructureModel) adds or removes contours.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    plane_index: i32,
    z_location: f64,
    contours: Vec<Contour>,
}

impl Slice {
    /// Builds a slice from the point lists returned for one image plane.
    ///
    /// The slice's Z is the Z of the first point of the first contour.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptySlice`] if `arrays` is empty, or
    /// [`GeometryError::EmptyContour`] if any point list is empty.
    pub fn from_point_arrays(plane_index: i32, arrays: Vec<Vec<Point3>>) -> Result<Self> {
        let contours = arrays
            .into_iter()
            .map(Contour::new)
            .collect::<Result<Vec<_>>>()?;
        Self::new(plane_index, contours)
    }

    /// Builds a slice from already constructed contours.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptySlice`] if `contours` is empty.
    pub fn new(plane_index: i32, contours: Vec<Contour>) -> Result<Self> {
        let z_location = contours
            .first()
            .map(Contour::z_location)
            .ok_or(GeometryError::EmptySlice)?;
        Ok(Self {
            plane_index,
            z_location,
            contours,
        })
    }

    /// Image-plane index this slice was read from.
    #[must_use]
    pub fn plane_index(&self) -> i32 {
        self.plane_index
    }

    /// Z of the plane, fixed at construction.
    #[must_use]
    pub fn z_location(&self) -> f64 {
        self.z_location
    }

    /// The contours in order.
    #[must_use]
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Returns the contour at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Contour> {
        self.contours.get(index)
    }

    /// Number of contours.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    /// `true` once every contour has been removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Iterates over the contours in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Contour> {
        self.contours.iter()
    }

    pub(crate) fn push(&mut self, contour: Contour) {
        self.contours.push(contour);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Contour {
        self.contours.remove(index)
    }

    /// An independent slice with the same Z and copies of every contour.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        Self {
            plane_index: self.plane_index,
            z_location: self.z_location,
            contours: self.contours.iter().map(Contour::deep_copy).collect(),
        }
    }

    /// The contours as point lists, in order.
    #[must_use]
    pub fn to_point_arrays(&self) -> Vec<Vec<Point3>> {
        self.contours.iter().map(Contour::copy_points).collect()
    }

    /// `Z`, the contour count, then one line per contour.
    #[must_use]
    pub fn render(&self, delimiter: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Z{delimiter}{}", self.z_location);
        let _ = writeln!(out, "nContours{delimiter}{}", self.contours.len());
        for contour in &self.contours {
            let _ = writeln!(out, "{}", contour.render(delimiter));
        }
        out
    }
}

impl<'a> IntoIterator for &'a Slice {
    type Item = &'a Contour;
    type IntoIter = std::slice::Iter<'a, Contour>;

    fn into_iter(self) -> Self::IntoIter {
        self.contours.iter()
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(","))
    }
}
