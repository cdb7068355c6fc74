//! Collaborator contract for the treatment-planning system's structure store.
//!
//! A [`StructureSet`] owns [`Structure`]s drawn on one image. The store is
//! authoritative: models built from it are snapshots, and every contour
//! mutation is pushed back through these traits immediately.
//!
//! [`MemoryStructureSet`] is a self-contained implementation used for tests
//! and offline processing.

mod memory;

pub use memory::{MemoryStructure, MemoryStructureSet, StructureKey};

use std::time::SystemTime;

use crate::error::StoreError;
use crate::math::{Aabb, ImageGeometry, Point3};

/// Approval state recorded in a structure's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    Unapproved,
    Reviewed,
    Approved,
    Rejected,
}

/// One entry of a structure's approval history.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalHistoryEntry {
    pub status: ApprovalStatus,
    pub user_id: String,
    pub date_time: SystemTime,
}

/// A single structure held by the external store.
pub trait Structure {
    /// Structure ID, unique within its set.
    fn id(&self) -> &str;

    /// Free-form display name.
    fn name(&self) -> &str;

    /// DICOM RT ROI interpreted type (e.g. `PTV`, `ORGAN`).
    fn dicom_type(&self) -> &str;

    /// ROI number within the structure set.
    fn roi_number(&self) -> i32;

    /// Enclosed volume in cm³.
    fn volume(&self) -> f64;

    /// Geometric center of the structure.
    fn center_point(&self) -> Point3;

    /// `true` if the structure holds no segment data.
    fn is_empty(&self) -> bool;

    /// 3D bounds of the contour mesh, or `None` if the structure has no mesh.
    fn bounds(&self) -> Option<Aabb>;

    fn is_high_resolution(&self) -> bool;

    /// Promotes the structure to high resolution. There is no way back.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store refuses the conversion.
    fn convert_to_high_resolution(&mut self) -> Result<(), StoreError>;

    /// Contours on the given image plane, each an ordered point list.
    fn contours_on_image_plane(&self, plane: i32) -> Vec<Vec<Point3>>;

    /// Adds a contour on the given image plane.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store rejects the contour.
    fn add_contour_on_image_plane(&mut self, points: &[Point3], plane: i32)
        -> Result<(), StoreError>;

    /// Subtracts a contour from the given image plane.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store rejects the contour.
    fn subtract_contour_on_image_plane(
        &mut self,
        points: &[Point3],
        plane: i32,
    ) -> Result<(), StoreError>;

    /// Approval history, oldest first.
    fn approval_history(&self) -> &[ApprovalHistoryEntry];

    fn history_user_name(&self) -> &str;

    fn history_user_display_name(&self) -> &str;

    fn history_date_time(&self) -> SystemTime;
}

/// A collection of structures drawn on one image.
pub trait StructureSet {
    /// Structure set ID.
    fn id(&self) -> &str;

    /// Geometry of the underlying image, or `None` if the set has no image.
    fn image(&self) -> Option<ImageGeometry>;

    /// IDs of every structure, in store order.
    fn structure_ids(&self) -> Vec<String>;

    /// Looks up a structure by exact ID.
    fn structure(&self, id: &str) -> Option<&dyn Structure>;

    /// Looks up a structure by exact ID for mutation.
    fn structure_mut(&mut self, id: &str) -> Option<&mut dyn Structure>;

    /// Whether a structure of `dicom_type` named `id` can be added.
    fn can_add_structure(&self, dicom_type: &str, id: &str) -> bool;

    /// Adds a new, empty structure.
    ///
    /// `Ok(None)` means the store accepted the call but produced nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store rejects the request.
    fn add_structure(
        &mut self,
        dicom_type: &str,
        id: &str,
    ) -> Result<Option<&mut dyn Structure>, StoreError>;
}
