use std::fmt;
use std::fmt::Write as _;

use tracing::debug;

use super::{Contour, Slice, StructureInfo};
use crate::error::{RangeError, Result, StructureError};
use crate::math::{Aabb, ImageGeometry};
use crate::operations::CloneStructure;
use crate::store::{Structure, StructureSet};

/// Selects a slice either by its position in the model or by world Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliceLocator {
    /// Position in the model's slice list.
    Position(usize),
    /// World Z, resolved to the nearest image plane.
    Z(f64),
}

impl From<usize> for SliceLocator {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

impl From<f64> for SliceLocator {
    fn from(z: f64) -> Self {
        Self::Z(z)
    }
}

/// Slice-by-slice view of one store structure.
///
/// Built once from the store by scanning every image plane between the
/// structure's lowest and highest Z. Planes without contours produce no
/// slice, so the slice list is sparse relative to plane indices: each
/// [`Slice`] remembers its plane, and every Z-based lookup goes through that
/// plane index rather than through an offset from [`min_slice`](Self::min_slice).
///
/// Contour mutations are written to the store in the same call. Changes made
/// to the store by anyone else are not observed; build a new model instead.
#[derive(Debug, Clone)]
pub struct StructureModel {
    set_id: String,
    image: Option<ImageGeometry>,
    bounds: Option<Aabb>,
    info: StructureInfo,
    slices: Vec<Slice>,
}

impl StructureModel {
    /// Builds the model for structure `structure_id` of `set`.
    ///
    /// A structure without mesh geometry, or a set without a usable image
    /// (see [`ImageGeometry::is_usable`]), yields a model with no slices.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::NotFound`] if the set has no such structure,
    /// or a geometry error if the store returns an empty point list.
    pub fn build<S: StructureSet + ?Sized>(set: &S, structure_id: &str) -> Result<Self> {
        let structure = set
            .structure(structure_id)
            .ok_or_else(|| StructureError::NotFound {
                id: structure_id.to_owned(),
                structure_set: set.id().to_owned(),
            })?;

        let mut model = Self {
            set_id: set.id().to_owned(),
            image: set.image().filter(ImageGeometry::is_usable),
            bounds: structure
                .bounds()
                .filter(|bb| bb.min.z.is_finite() && bb.max.z.is_finite()),
            info: StructureInfo::capture(structure),
            slices: Vec::new(),
        };

        let (Some(min_slice), Some(max_slice)) = (model.min_slice(), model.max_slice()) else {
            debug!(structure_id, "structure has no usable geometry");
            return Ok(model);
        };

        for plane in min_slice..=max_slice {
            let arrays = structure.contours_on_image_plane(plane);
            if arrays.is_empty() {
                continue;
            }
            model.slices.push(Slice::from_point_arrays(plane, arrays)?);
        }

        debug!(
            structure_id,
            min_slice,
            max_slice,
            slices = model.slices.len(),
            "built structure model"
        );
        Ok(model)
    }

    // --- Snapshot accessors ---

    #[must_use]
    pub fn id(&self) -> &str {
        &self.info.id
    }

    /// ID of the structure set the model was built from.
    #[must_use]
    pub fn structure_set_id(&self) -> &str {
        &self.set_id
    }

    /// Store scalars captured at build time.
    #[must_use]
    pub fn info(&self) -> &StructureInfo {
        &self.info
    }

    #[must_use]
    pub fn dicom_type(&self) -> &str {
        &self.info.dicom_type
    }

    #[must_use]
    pub fn is_high_resolution(&self) -> bool {
        self.info.is_high_resolution
    }

    #[must_use]
    pub fn approved(&self) -> bool {
        self.info.approved()
    }

    #[must_use]
    pub fn has_volume(&self) -> bool {
        self.info.has_volume()
    }

    /// `true` if at least one plane holds contours.
    #[must_use]
    pub fn has_segments(&self) -> bool {
        !self.slices.is_empty()
    }

    #[must_use]
    pub fn image(&self) -> Option<ImageGeometry> {
        self.image
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.bounds
    }

    #[must_use]
    pub fn min_z(&self) -> Option<f64> {
        self.bounds.map(|bb| bb.min.z)
    }

    #[must_use]
    pub fn max_z(&self) -> Option<f64> {
        self.bounds.map(|bb| bb.max.z)
    }

    /// Image plane holding [`min_z`](Self::min_z).
    #[must_use]
    pub fn min_slice(&self) -> Option<i32> {
        self.slice_index(self.min_z()?)
    }

    /// Image plane holding [`max_z`](Self::max_z).
    #[must_use]
    pub fn max_slice(&self) -> Option<i32> {
        self.slice_index(self.max_z()?)
    }

    /// Nearest image plane to `z` in this model's image geometry.
    #[must_use]
    pub fn slice_index(&self, z: f64) -> Option<i32> {
        self.image.map(|geo| geo.slice_index(z))
    }

    // --- Slice access ---

    #[must_use]
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Number of slices, i.e. planes holding contours.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slice> {
        self.slices.iter()
    }

    /// Slice at `position` in the slice list.
    #[must_use]
    pub fn slice(&self, position: usize) -> Option<&Slice> {
        self.slices.get(position)
    }

    /// Position of the slice read from image plane `plane`, if it has one.
    #[must_use]
    pub fn position_of_plane(&self, plane: i32) -> Option<usize> {
        self.slices
            .binary_search_by_key(&plane, Slice::plane_index)
            .ok()
    }

    /// Slice on the image plane nearest to `z`.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::ZOutOfRange`] if `z` lies outside
    /// `[min_z, max_z]`, [`RangeError::EmptyPlane`] if the plane holds no
    /// contours, or [`RangeError::NoGeometry`] for a model without geometry.
    pub fn slice_at_z(&self, z: f64) -> Result<&Slice> {
        let position = self.resolve(SliceLocator::Z(z))?;
        Ok(&self.slices[position])
    }

    /// Contour `contour_index` of the located slice.
    ///
    /// An out-of-bounds `contour_index` yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a [`RangeError`] if the slice itself cannot be located.
    pub fn get_contour(
        &self,
        at: impl Into<SliceLocator>,
        contour_index: usize,
    ) -> Result<Option<&Contour>> {
        let position = self.resolve(at.into())?;
        Ok(self.slices[position].get(contour_index))
    }

    // --- Mutation ---

    /// Appends `contour` to the located slice and adds it to the store on the
    /// slice's image plane.
    ///
    /// When located by Z, a plane inside the model's range that holds no
    /// contours yet gets a new slice, inserted in plane order.
    ///
    /// # Errors
    ///
    /// Returns a [`RangeError`] if the slice cannot be located, or a
    /// [`StructureError`] if `set` is not the model's set or the store rejects
    /// the contour. The model is unchanged on error.
    pub fn add_contour_to_slice<S: StructureSet + ?Sized>(
        &mut self,
        set: &mut S,
        contour: Contour,
        at: impl Into<SliceLocator>,
    ) -> Result<()> {
        let (plane, slot) = match at.into() {
            SliceLocator::Position(position) => {
                let position = self.resolve(SliceLocator::Position(position))?;
                (self.slices[position].plane_index(), Ok(position))
            }
            SliceLocator::Z(z) => {
                let plane = self.plane_for_z(z)?;
                let slot = self
                    .slices
                    .binary_search_by_key(&plane, Slice::plane_index);
                (plane, slot)
            }
        };

        self.structure_in(set)?
            .add_contour_on_image_plane(contour.points(), plane)
            .map_err(|source| StructureError::Store {
                id: self.info.id.clone(),
                source,
            })?;
        debug!(structure_id = %self.info.id, plane, points = contour.len(), "added contour");

        match slot {
            Ok(position) => self.slices[position].push(contour),
            Err(insert_at) => self
                .slices
                .insert(insert_at, Slice::new(plane, vec![contour])?),
        }
        Ok(())
    }

    /// Removes contour `contour_index` from the located slice and subtracts it
    /// from the store on the slice's image plane.
    ///
    /// The slice stays in the model even when its last contour is removed.
    ///
    /// # Errors
    ///
    /// Returns a [`RangeError`] if the slice or contour index is out of range,
    /// in which case the store is not touched, or a [`StructureError`] if the
    /// store rejects the subtraction.
    pub fn remove_contour_from_slice<S: StructureSet + ?Sized>(
        &mut self,
        set: &mut S,
        at: impl Into<SliceLocator>,
        contour_index: usize,
    ) -> Result<Contour> {
        let position = self.resolve(at.into())?;
        let slice = &self.slices[position];
        let contour = slice
            .get(contour_index)
            .ok_or(RangeError::ContourOutOfRange {
                index: contour_index,
                len: slice.len(),
            })?;
        let plane = slice.plane_index();

        self.structure_in(set)?
            .subtract_contour_on_image_plane(contour.points(), plane)
            .map_err(|source| StructureError::Store {
                id: self.info.id.clone(),
                source,
            })?;
        debug!(structure_id = %self.info.id, plane, "removed contour");

        Ok(self.slices[position].remove(contour_index))
    }

    // --- Cloning ---

    /// Copies this structure's contours into a new structure `new_id` of
    /// `destination`, reading the current contours from `source`.
    ///
    /// Returns the ID of the new structure.
    ///
    /// # Errors
    ///
    /// See [`CloneStructure::execute`].
    pub fn clone_structure<S, D>(&self, source: &S, new_id: &str, destination: &mut D) -> Result<String>
    where
        S: StructureSet + ?Sized,
        D: StructureSet + ?Sized,
    {
        self.check_set(source)?;
        CloneStructure::new(self.id(), new_id).execute(source, destination)
    }

    /// Clones into `destination` and returns a model built from what the
    /// store persisted.
    ///
    /// # Errors
    ///
    /// See [`CloneStructure::execute`].
    pub fn clone_model<S, D>(&self, source: &S, new_id: &str, destination: &mut D) -> Result<Self>
    where
        S: StructureSet + ?Sized,
        D: StructureSet + ?Sized,
    {
        let id = self.clone_structure(source, new_id, destination)?;
        Self::build(&*destination, &id)
    }

    /// Clones into the structure's own set and returns the rebuilt model.
    ///
    /// # Errors
    ///
    /// See [`CloneStructure::execute`].
    pub fn clone_within<S: StructureSet + ?Sized>(&self, set: &mut S, new_id: &str) -> Result<Self> {
        self.check_set(&*set)?;
        let id = CloneStructure::new(self.id(), new_id).execute_within(set)?;
        Self::build(&*set, &id)
    }

    /// Clones into the structure's own set as `{id}_clone`.
    ///
    /// # Errors
    ///
    /// See [`CloneStructure::execute`].
    pub fn clone_default<S: StructureSet + ?Sized>(&self, set: &mut S) -> Result<Self> {
        let new_id = format!("{}_clone", self.id());
        self.clone_within(set, &new_id)
    }

    // --- Text ---

    /// `Structure ID`, then every slice's text followed by a blank line.
    #[must_use]
    pub fn render(&self, delimiter: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Structure ID{delimiter}{}", self.info.id);
        for slice in &self.slices {
            let _ = writeln!(out, "{}", slice.render(delimiter));
        }
        out
    }

    // --- Internals ---

    fn plane_for_z(&self, z: f64) -> Result<i32> {
        let (Some(geo), Some(bb)) = (self.image, self.bounds) else {
            return Err(RangeError::NoGeometry.into());
        };
        if !(bb.min.z..=bb.max.z).contains(&z) {
            return Err(RangeError::ZOutOfRange {
                z,
                min: bb.min.z,
                max: bb.max.z,
            }
            .into());
        }
        Ok(geo.slice_index(z))
    }

    fn resolve(&self, at: SliceLocator) -> Result<usize> {
        match at {
            SliceLocator::Position(position) if position < self.slices.len() => Ok(position),
            SliceLocator::Position(position) => Err(RangeError::SliceOutOfRange {
                position,
                len: self.slices.len(),
            }
            .into()),
            SliceLocator::Z(z) => {
                let plane = self.plane_for_z(z)?;
                self.position_of_plane(plane)
                    .ok_or_else(|| RangeError::EmptyPlane { plane }.into())
            }
        }
    }

    fn check_set<S: StructureSet + ?Sized>(&self, set: &S) -> Result<()> {
        if set.id() == self.set_id {
            Ok(())
        } else {
            Err(StructureError::SetMismatch {
                id: self.info.id.clone(),
                expected: self.set_id.clone(),
                actual: set.id().to_owned(),
            }
            .into())
        }
    }

    fn structure_in<'s, S: StructureSet + ?Sized>(
        &self,
        set: &'s mut S,
    ) -> Result<&'s mut dyn Structure> {
        self.check_set(&*set)?;
        let structure_set = set.id().to_owned();
        set.structure_mut(&self.info.id).ok_or_else(|| {
            StructureError::NotFound {
                id: self.info.id.clone(),
                structure_set,
            }
            .into()
        })
    }
}

impl<'a> IntoIterator for &'a StructureModel {
    type Item = &'a Slice;
    type IntoIter = std::slice::Iter<'a, Slice>;

    fn into_iter(self) -> Self::IntoIter {
        self.slices.iter()
    }
}

impl fmt::Display for StructureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(","))
    }
}
