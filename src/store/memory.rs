use std::collections::BTreeMap;
use std::time::SystemTime;

use slotmap::SlotMap;

use super::{ApprovalHistoryEntry, Structure, StructureSet};
use crate::error::StoreError;
use crate::math::polygon_2d::{centroid, signed_area_2d};
use crate::math::{Aabb, ImageGeometry, Point3};
use crate::operations::DEFAULT_MAX_ID_LENGTH;

slotmap::new_key_type! {
    /// Unique identifier for a structure in a [`MemoryStructureSet`].
    pub struct StructureKey;
}

/// A structure whose contours live in memory, keyed by image plane.
#[derive(Debug, Clone)]
pub struct MemoryStructure {
    id: String,
    name: String,
    dicom_type: String,
    roi_number: i32,
    planes: BTreeMap<i32, Vec<Vec<Point3>>>,
    high_resolution: bool,
    plane_spacing: Option<f64>,
    approval_history: Vec<ApprovalHistoryEntry>,
    history_user_name: String,
    history_user_display_name: String,
    history_date_time: SystemTime,
}

impl MemoryStructure {
    /// Creates an empty structure.
    #[must_use]
    pub fn new(id: impl Into<String>, dicom_type: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            dicom_type: dicom_type.into(),
            roi_number: 0,
            planes: BTreeMap::new(),
            high_resolution: false,
            plane_spacing: None,
            approval_history: Vec::new(),
            history_user_name: String::new(),
            history_user_display_name: String::new(),
            history_date_time: SystemTime::UNIX_EPOCH,
        }
    }

    /// Appends a contour on `plane`.
    #[must_use]
    pub fn with_contour(mut self, plane: i32, points: Vec<Point3>) -> Self {
        self.planes.entry(plane).or_default().push(points);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_high_resolution(mut self) -> Self {
        self.high_resolution = true;
        self
    }

    /// Appends an approval history entry.
    #[must_use]
    pub fn with_approval(mut self, entry: ApprovalHistoryEntry) -> Self {
        self.approval_history.push(entry);
        self
    }

    /// Sets who last modified the structure, and when.
    #[must_use]
    pub fn with_history(
        mut self,
        user_name: impl Into<String>,
        display_name: impl Into<String>,
        date_time: SystemTime,
    ) -> Self {
        self.history_user_name = user_name.into();
        self.history_user_display_name = display_name.into();
        self.history_date_time = date_time;
        self
    }

    /// Number of contours stored on `plane`.
    #[must_use]
    pub fn contour_count(&self, plane: i32) -> usize {
        self.planes.get(&plane).map_or(0, Vec::len)
    }

    fn all_points(&self) -> impl Iterator<Item = &Point3> {
        self.planes.values().flatten().flatten()
    }
}

impl Structure for MemoryStructure {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dicom_type(&self) -> &str {
        &self.dicom_type
    }

    fn roi_number(&self) -> i32 {
        self.roi_number
    }

    /// Sum of contour areas times plane spacing, in cm³.
    fn volume(&self) -> f64 {
        let Some(spacing) = self.plane_spacing else {
            return 0.0;
        };
        let area_mm2: f64 = self
            .planes
            .values()
            .flatten()
            .map(|c| signed_area_2d(c).abs())
            .sum();
        area_mm2 * spacing / 1000.0
    }

    fn center_point(&self) -> Point3 {
        let points: Vec<Point3> = self.all_points().copied().collect();
        centroid(&points).unwrap_or_else(Point3::origin)
    }

    fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.all_points())
    }

    fn is_high_resolution(&self) -> bool {
        self.high_resolution
    }

    fn convert_to_high_resolution(&mut self) -> Result<(), StoreError> {
        self.high_resolution = true;
        Ok(())
    }

    fn contours_on_image_plane(&self, plane: i32) -> Vec<Vec<Point3>> {
        self.planes.get(&plane).cloned().unwrap_or_default()
    }

    fn add_contour_on_image_plane(
        &mut self,
        points: &[Point3],
        plane: i32,
    ) -> Result<(), StoreError> {
        if points.is_empty() {
            return Err(StoreError::new(format!(
                "cannot add an empty contour to {} on plane {plane}",
                self.id
            )));
        }
        self.planes.entry(plane).or_default().push(points.to_vec());
        Ok(())
    }

    /// Removes the first stored contour equal to `points`.
    fn subtract_contour_on_image_plane(
        &mut self,
        points: &[Point3],
        plane: i32,
    ) -> Result<(), StoreError> {
        let missing = || {
            StoreError::new(format!(
                "no matching contour in {} on plane {plane}",
                self.id
            ))
        };
        let contours = self.planes.get_mut(&plane).ok_or_else(missing)?;
        let index = contours
            .iter()
            .position(|c| c.as_slice() == points)
            .ok_or_else(missing)?;
        contours.remove(index);
        if contours.is_empty() {
            self.planes.remove(&plane);
        }
        Ok(())
    }

    fn approval_history(&self) -> &[ApprovalHistoryEntry] {
        &self.approval_history
    }

    fn history_user_name(&self) -> &str {
        &self.history_user_name
    }

    fn history_user_display_name(&self) -> &str {
        &self.history_user_display_name
    }

    fn history_date_time(&self) -> SystemTime {
        self.history_date_time
    }
}

/// A structure set held entirely in memory.
#[derive(Debug)]
pub struct MemoryStructureSet {
    id: String,
    image: Option<ImageGeometry>,
    structures: SlotMap<StructureKey, MemoryStructure>,
    order: Vec<StructureKey>,
    capacity: Option<usize>,
    next_roi_number: i32,
}

impl MemoryStructureSet {
    /// Creates an empty structure set over the given image.
    #[must_use]
    pub fn new(id: impl Into<String>, image: Option<ImageGeometry>) -> Self {
        Self {
            id: id.into(),
            image,
            structures: SlotMap::with_key(),
            order: Vec::new(),
            capacity: None,
            next_roi_number: 1,
        }
    }

    /// Caps the number of structures the set accepts.
    #[must_use]
    pub fn with_capacity_limit(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Inserts a prepared structure, assigning its ROI number.
    pub fn insert(&mut self, mut structure: MemoryStructure) -> StructureKey {
        structure.roi_number = self.next_roi_number;
        self.next_roi_number += 1;
        structure.plane_spacing = self.image.map(|geo| geo.z_res);
        let key = self.structures.insert(structure);
        self.order.push(key);
        key
    }

    /// Returns the structure stored under `key`.
    #[must_use]
    pub fn get(&self, key: StructureKey) -> Option<&MemoryStructure> {
        self.structures.get(key)
    }

    /// Looks up a concrete structure by exact ID.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&MemoryStructure> {
        self.key_of(id).and_then(|key| self.structures.get(key))
    }

    /// Number of structures in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn key_of(&self, id: &str) -> Option<StructureKey> {
        self.order
            .iter()
            .copied()
            .find(|key| self.structures.get(*key).is_some_and(|s| s.id == id))
    }

    fn has_id_ignoring_case(&self, id: &str) -> bool {
        self.structures
            .values()
            .any(|s| s.id.eq_ignore_ascii_case(id))
    }
}

impl StructureSet for MemoryStructureSet {
    fn id(&self) -> &str {
        &self.id
    }

    fn image(&self) -> Option<ImageGeometry> {
        self.image
    }

    fn structure_ids(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|key| self.structures.get(*key))
            .map(|s| s.id.clone())
            .collect()
    }

    fn structure(&self, id: &str) -> Option<&dyn Structure> {
        self.find(id).map(|s| s as &dyn Structure)
    }

    fn structure_mut(&mut self, id: &str) -> Option<&mut dyn Structure> {
        let key = self.key_of(id)?;
        self.structures
            .get_mut(key)
            .map(|s| s as &mut dyn Structure)
    }

    fn can_add_structure(&self, dicom_type: &str, id: &str) -> bool {
        !dicom_type.is_empty()
            && !id.is_empty()
            && id.chars().count() <= DEFAULT_MAX_ID_LENGTH
            && !self.has_id_ignoring_case(id)
            && self.capacity.map_or(true, |cap| self.order.len() < cap)
    }

    fn add_structure(
        &mut self,
        dicom_type: &str,
        id: &str,
    ) -> Result<Option<&mut dyn Structure>, StoreError> {
        if !self.can_add_structure(dicom_type, id) {
            return Err(StoreError::new(format!(
                "structure set {} cannot host {id} ({dicom_type})",
                self.id
            )));
        }
        let key = self.insert(MemoryStructure::new(id, dicom_type));
        Ok(self
            .structures
            .get_mut(key)
            .map(|s| s as &mut dyn Structure))
    }
}
