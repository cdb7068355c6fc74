use tracing::{debug, info};

use super::{validate_structure_id, AddStructure, CreateOptions, DEFAULT_MAX_ID_LENGTH};
use crate::error::{RangeError, Result, StoreError, StructureError};
use crate::math::ImageGeometry;
use crate::model::StructureModel;
use crate::store::StructureSet;

/// Copies every contour of a structure into a new structure.
///
/// Contours are re-indexed by Z against the destination image, so the
/// destination may use a different plane spacing or origin than the source.
/// A high-resolution source produces a high-resolution copy.
///
/// Contours already pushed stay in the destination if a later push fails.
pub struct CloneStructure {
    source_id: String,
    new_id: String,
}

/// What the clone needs from the source, read before the destination is
/// touched.
struct CloneSource {
    dicom_type: String,
    high_resolution: bool,
    model: StructureModel,
}

impl CloneStructure {
    /// Creates a new `CloneStructure` operation.
    #[must_use]
    pub fn new(source_id: impl Into<String>, new_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            new_id: new_id.into(),
        }
    }

    /// Clones structure `source_id` of `source` into `destination` as
    /// `new_id`, returning the ID of the new structure.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`](crate::error::ValidationError) if `new_id` is
    ///   empty or too long.
    /// - [`StructureError::NotFound`] if the source structure does not exist.
    /// - [`StructureError::CannotAdd`] if the destination refuses the ID/type.
    /// - [`RangeError::NoGeometry`] if the destination has no usable image.
    /// - [`StructureError::CreationFailed`] or [`StructureError::Store`] if
    ///   the store fails while creating or filling the new structure.
    pub fn execute<S, D>(&self, source: &S, destination: &mut D) -> Result<String>
    where
        S: StructureSet + ?Sized,
        D: StructureSet + ?Sized,
    {
        let read = self.read_source(source)?;
        self.write_destination(read, destination)
    }

    /// Clones within a single structure set.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub fn execute_within<S: StructureSet + ?Sized>(&self, set: &mut S) -> Result<String> {
        let read = self.read_source(&*set)?;
        self.write_destination(read, set)
    }

    fn read_source<S: StructureSet + ?Sized>(&self, source: &S) -> Result<CloneSource> {
        validate_structure_id(&self.new_id, DEFAULT_MAX_ID_LENGTH)?;
        let model = StructureModel::build(source, &self.source_id)?;
        Ok(CloneSource {
            dicom_type: model.dicom_type().to_owned(),
            high_resolution: model.is_high_resolution(),
            model,
        })
    }

    fn write_destination<D: StructureSet + ?Sized>(
        &self,
        source: CloneSource,
        destination: &mut D,
    ) -> Result<String> {
        if !destination.can_add_structure(&source.dicom_type, &self.new_id) {
            return Err(StructureError::CannotAdd {
                id: self.new_id.clone(),
                dicom_type: source.dicom_type,
                structure_set: destination.id().to_owned(),
            }
            .into());
        }
        let image = destination
            .image()
            .filter(ImageGeometry::is_usable)
            .ok_or(RangeError::NoGeometry)?;

        let created = AddStructure::new(source.dicom_type.as_str(), self.new_id.as_str())
            .with_options(CreateOptions {
                overwrite: true,
                error_on_missing: true,
                ..CreateOptions::default()
            })
            .execute(destination)?;
        let id = created.id;

        let structure_set = destination.id().to_owned();
        let target = destination
            .structure_mut(&id)
            .ok_or_else(|| StructureError::NotFound {
                id: id.clone(),
                structure_set,
            })?;
        let store_error = |source: StoreError| StructureError::Store {
            id: id.clone(),
            source,
        };

        if source.high_resolution {
            target.convert_to_high_resolution().map_err(store_error)?;
        }

        let mut contours = 0_usize;
        for slice in &source.model {
            let plane = image.slice_index(slice.z_location());
            for contour in slice {
                target
                    .add_contour_on_image_plane(contour.points(), plane)
                    .map_err(store_error)?;
                contours += 1;
            }
            debug!(structure_id = %id, plane, contours = slice.len(), "cloned slice");
        }

        info!(
            source_id = %self.source_id,
            structure_id = %id,
            slices = source.model.len(),
            contours,
            high_resolution = source.high_resolution,
            "cloned structure"
        );
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{RtStructError, ValidationError};
    use crate::math::Point3;
    use crate::model::Slice;
    use crate::store::{MemoryStructure, MemoryStructureSet, Structure};

    fn square(z: f64, size: f64) -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(size, 0.0, z),
            Point3::new(size, size, z),
            Point3::new(0.0, size, z),
        ]
    }

    /// "Liver" with one contour on planes 2 and 5 and two on plane 3.
    fn source_set(geo: ImageGeometry) -> MemoryStructureSet {
        let mut ss = MemoryStructureSet::new("CT_1", Some(geo));
        ss.insert(
            MemoryStructure::new("Liver", "ORGAN")
                .with_contour(2, square(geo.plane_z(2), 10.0))
                .with_contour(3, square(geo.plane_z(3), 10.0))
                .with_contour(3, square(geo.plane_z(3), 4.0))
                .with_contour(5, square(geo.plane_z(5), 8.0)),
        );
        ss
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn contour_counts(model: &StructureModel) -> Vec<(i32, usize)> {
        model.iter().map(|s| (s.plane_index(), s.len())).collect()
    }

    #[test]
    fn identical_geometry_preserves_slices_and_contours() {
        init_tracing();
        let geo = ImageGeometry::new(-30.0, 3.0);
        let source = source_set(geo);
        let mut destination = MemoryStructureSet::new("CT_1_copy", Some(geo));

        let id = CloneStructure::new("Liver", "Liver_2")
            .execute(&source, &mut destination)
            .unwrap();
        assert_eq!(id, "Liver_2");

        let original = StructureModel::build(&source, "Liver").unwrap();
        let copy = StructureModel::build(&destination, "Liver_2").unwrap();
        assert_eq!(copy.len(), original.len());
        assert_eq!(contour_counts(&copy), contour_counts(&original));
        assert_eq!(copy.dicom_type(), "ORGAN");
        assert!(!copy.is_high_resolution());
    }

    #[test]
    fn destination_spacing_reindexes_planes() {
        let source = source_set(ImageGeometry::new(0.0, 3.0));
        // same world Z, half the spacing, shifted origin
        let mut destination =
            MemoryStructureSet::new("CT_fine", Some(ImageGeometry::new(-6.0, 1.5)));

        CloneStructure::new("Liver", "Liver_fine")
            .execute(&source, &mut destination)
            .unwrap();

        let copy = StructureModel::build(&destination, "Liver_fine").unwrap();
        let planes: Vec<i32> = copy.iter().map(Slice::plane_index).collect();
        assert_eq!(planes, vec![8, 10, 14]);
        assert_eq!(copy.slice(1).unwrap().len(), 2);
    }

    #[test]
    fn high_resolution_is_promoted() {
        let geo = ImageGeometry::new(0.0, 2.0);
        let mut set = MemoryStructureSet::new("CT_1", Some(geo));
        set.insert(
            MemoryStructure::new("Lens_L", "ORGAN")
                .with_contour(1, square(geo.plane_z(1), 1.0))
                .with_high_resolution(),
        );

        let id = CloneStructure::new("Lens_L", "Lens_L_hr")
            .execute_within(&mut set)
            .unwrap();
        let copy = set.structure(&id).unwrap();
        assert!(copy.is_high_resolution());
        assert_eq!(copy.contours_on_image_plane(1).len(), 1);
    }

    #[test]
    fn refused_id_is_reported_with_the_id() {
        let geo = ImageGeometry::new(0.0, 3.0);
        let mut set = source_set(geo);
        set.insert(MemoryStructure::new("Taken", "ORGAN"));

        let err = CloneStructure::new("Liver", "TAKEN")
            .execute_within(&mut set)
            .unwrap_err();
        match err {
            RtStructError::Structure(e @ StructureError::CannotAdd { .. }) => {
                assert_eq!(e.structure_id(), "TAKEN");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn long_id_fails_validation_before_any_create() {
        let mut set = source_set(ImageGeometry::new(0.0, 3.0));
        let err = CloneStructure::new("Liver", "Liver_clone_12345")
            .execute_within(&mut set)
            .unwrap_err();
        assert!(matches!(
            err,
            RtStructError::Validation(ValidationError::IdTooLong { length: 17, .. })
        ));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn destination_without_image_is_refused() {
        let source = source_set(ImageGeometry::new(0.0, 3.0));
        let mut destination = MemoryStructureSet::new("NoImage", None);
        let err = CloneStructure::new("Liver", "Liver_2")
            .execute(&source, &mut destination)
            .unwrap_err();
        assert!(matches!(err, RtStructError::Range(RangeError::NoGeometry)));
        assert!(destination.is_empty());
    }

    #[test]
    fn destination_with_zero_spacing_is_refused() {
        let source = source_set(ImageGeometry::new(0.0, 3.0));
        let mut destination = MemoryStructureSet::new("Flat", Some(ImageGeometry::new(0.0, 0.0)));
        let err = CloneStructure::new("Liver", "Liver_2")
            .execute(&source, &mut destination)
            .unwrap_err();
        assert!(matches!(err, RtStructError::Range(RangeError::NoGeometry)));
        assert!(destination.is_empty());
    }

    #[test]
    fn missing_source_is_not_found() {
        let mut set = source_set(ImageGeometry::new(0.0, 3.0));
        let err = CloneStructure::new("Spleen", "Spleen_2")
            .execute_within(&mut set)
            .unwrap_err();
        assert!(matches!(
            err,
            RtStructError::Structure(StructureError::NotFound { .. })
        ));
    }
}
