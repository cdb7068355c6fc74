use std::time::SystemTime;

use crate::math::Point3;
use crate::store::{ApprovalStatus, Structure};

/// Read-only scalars of a store structure, captured when a model is built.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureInfo {
    pub id: String,
    pub name: String,
    pub dicom_type: String,
    pub roi_number: i32,
    pub volume: f64,
    pub center_point: Point3,
    pub is_empty: bool,
    pub is_high_resolution: bool,
    pub history_user_name: String,
    pub history_user_display_name: String,
    pub history_date_time: SystemTime,
    /// Status of the most recent approval history entry.
    pub approval_status: Option<ApprovalStatus>,
}

impl StructureInfo {
    /// Captures the current scalars of `structure`.
    #[must_use]
    pub fn capture(structure: &dyn Structure) -> Self {
        Self {
            id: structure.id().to_owned(),
            name: structure.name().to_owned(),
            dicom_type: structure.dicom_type().to_owned(),
            roi_number: structure.roi_number(),
            volume: structure.volume(),
            center_point: structure.center_point(),
            is_empty: structure.is_empty(),
            is_high_resolution: structure.is_high_resolution(),
            history_user_name: structure.history_user_name().to_owned(),
            history_user_display_name: structure.history_user_display_name().to_owned(),
            history_date_time: structure.history_date_time(),
            approval_status: structure.approval_history().last().map(|entry| entry.status),
        }
    }

    /// `true` if the latest approval entry is [`ApprovalStatus::Approved`].
    #[must_use]
    pub fn approved(&self) -> bool {
        self.approval_status == Some(ApprovalStatus::Approved)
    }

    #[must_use]
    pub fn has_volume(&self) -> bool {
        self.volume > 0.0
    }
}
