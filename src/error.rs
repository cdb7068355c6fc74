use thiserror::Error;

/// Top-level error type for the structure model.
#[derive(Debug, Error)]
pub enum RtStructError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Errors raised while building contours and slices from raw point data.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("contour has no points")]
    EmptyContour,

    #[error("slice has no contours")]
    EmptySlice,
}

/// Input validation failures, raised before any call into the structure store.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("structure ID is an empty string")]
    EmptyId,

    #[error("structure ID {id} is too long (length = {length}; max = {max})")]
    IdTooLong { id: String, length: usize, max: usize },

    #[error("structure type is an empty string")]
    EmptyType,
}

/// Failure reported by a structure store implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    /// Creates a store error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failures tied to a structure's identity. Every variant carries the ID.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("can't add structure {id} of type {dicom_type} to structure set {structure_set}")]
    CannotAdd {
        id: String,
        dicom_type: String,
        structure_set: String,
    },

    #[error("{id} exists in structure set {structure_set} and can't be overwritten")]
    AlreadyExists { id: String, structure_set: String },

    #[error("unable to add structure {id} to structure set {structure_set} ({reason})")]
    CreationFailed {
        id: String,
        structure_set: String,
        reason: String,
    },

    #[error("structure {id} not found in structure set {structure_set}")]
    NotFound { id: String, structure_set: String },

    #[error("structure store rejected an operation on {id}")]
    Store {
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("structure {id} belongs to structure set {expected}, not {actual}")]
    SetMismatch {
        id: String,
        expected: String,
        actual: String,
    },
}

impl StructureError {
    /// The ID of the structure the failure refers to.
    #[must_use]
    pub fn structure_id(&self) -> &str {
        match self {
            Self::CannotAdd { id, .. }
            | Self::AlreadyExists { id, .. }
            | Self::CreationFailed { id, .. }
            | Self::NotFound { id, .. }
            | Self::Store { id, .. }
            | Self::SetMismatch { id, .. } => id,
        }
    }
}

/// Lookups outside the model's Z range or list bounds.
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("z = {z} must be between {min} and {max}")]
    ZOutOfRange { z: f64, min: f64, max: f64 },

    #[error("slice position {position} is out of range (slice count = {len})")]
    SliceOutOfRange { position: usize, len: usize },

    #[error("contour index {index} is out of range (contour count = {len})")]
    ContourOutOfRange { index: usize, len: usize },

    #[error("image plane {plane} holds no contours")]
    EmptyPlane { plane: i32 },

    #[error("structure has no usable geometry")]
    NoGeometry,
}

/// Errors related to writing exported text.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for results using [`RtStructError`].
pub type Result<T> = std::result::Result<T, RtStructError>;
