use tracing::{info, warn};

use crate::error::{Result, StructureError, ValidationError};
use crate::store::StructureSet;

/// Longest structure ID the store accepts.
pub const DEFAULT_MAX_ID_LENGTH: usize = 16;

/// Options controlling [`AddStructure`].
#[derive(Debug, Clone, Copy)]
pub struct CreateOptions {
    /// Reuse a structure whose ID matches (ignoring case) instead of failing.
    pub overwrite: bool,
    /// Fail if the store produces no structure, rather than reporting
    /// [`CreationOutcome::Missing`].
    pub error_on_missing: bool,
    /// Maximum ID length, in characters.
    pub max_id_length: usize,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            error_on_missing: false,
            max_id_length: DEFAULT_MAX_ID_LENGTH,
        }
    }
}

/// How an [`AddStructure`] call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationOutcome {
    /// An existing structure with the same ID was returned.
    Reused,
    /// A new structure was created and found in the set.
    Created,
    /// The store produced nothing usable.
    Missing,
}

/// Result of one [`AddStructure`] call, with the messages it produced.
#[derive(Debug, Clone)]
pub struct StructureCreation {
    /// ID of the structure in the set. For [`CreationOutcome::Reused`] this is
    /// the stored spelling, which may differ in case from the request.
    pub id: String,
    pub outcome: CreationOutcome,
    pub diagnostics: Vec<String>,
}

impl StructureCreation {
    /// The usable structure ID, or `None` when the outcome is `Missing`.
    #[must_use]
    pub fn structure_id(&self) -> Option<&str> {
        match self.outcome {
            CreationOutcome::Missing => None,
            CreationOutcome::Reused | CreationOutcome::Created => Some(&self.id),
        }
    }
}

/// Checks a structure ID against the store's naming rules.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyId`] or [`ValidationError::IdTooLong`].
pub fn validate_structure_id(id: &str, max_id_length: usize) -> std::result::Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    let length = id.chars().count();
    if length > max_id_length {
        return Err(ValidationError::IdTooLong {
            id: id.to_owned(),
            length,
            max: max_id_length,
        });
    }
    Ok(())
}

/// Adds a structure to a set, or reuses an existing one with the same ID.
pub struct AddStructure {
    dicom_type: String,
    id: String,
    options: CreateOptions,
}

impl AddStructure {
    /// Creates a new `AddStructure` operation with default options.
    #[must_use]
    pub fn new(dicom_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            dicom_type: dicom_type.into(),
            id: id.into(),
            options: CreateOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CreateOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the operation against `set`.
    ///
    /// The ID and type are validated before the store is touched. After a
    /// create, the new ID is looked up again to confirm the store kept it.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`] for an empty or over-length ID, or an empty type.
    /// - [`StructureError::AlreadyExists`] if the ID is taken and `overwrite`
    ///   is off.
    /// - [`StructureError::Store`] if the store rejects the create.
    /// - [`StructureError::CreationFailed`] if the store produced nothing or
    ///   the new ID cannot be found, and `error_on_missing` is on.
    pub fn execute<S: StructureSet + ?Sized>(&self, set: &mut S) -> Result<StructureCreation> {
        validate_structure_id(&self.id, self.options.max_id_length)?;
        if self.dicom_type.is_empty() {
            return Err(ValidationError::EmptyType.into());
        }

        let mut diagnostics = Vec::new();
        let structure_set = set.id().to_owned();

        let existing = set
            .structure_ids()
            .into_iter()
            .find(|id| id.eq_ignore_ascii_case(&self.id));
        if let Some(existing) = existing {
            if !self.options.overwrite {
                return Err(StructureError::AlreadyExists {
                    id: self.id.clone(),
                    structure_set,
                }
                .into());
            }
            warn!(structure_id = %existing, structure_set = %structure_set, "reusing existing structure");
            diagnostics.push(format!("Found {existing} in the structure set."));
            return Ok(StructureCreation {
                id: existing,
                outcome: CreationOutcome::Reused,
                diagnostics,
            });
        }

        let produced = set
            .add_structure(&self.dicom_type, &self.id)
            .map_err(|source| StructureError::Store {
                id: self.id.clone(),
                source,
            })?
            .is_some();
        if !produced && self.options.error_on_missing {
            return Err(StructureError::CreationFailed {
                id: self.id.clone(),
                structure_set,
                reason: "structure is null".into(),
            }
            .into());
        }

        if set.structure(&self.id).is_none() {
            diagnostics.push(format!("Testing structure was null when creating {}", self.id));
            if self.options.error_on_missing {
                return Err(StructureError::CreationFailed {
                    id: self.id.clone(),
                    structure_set,
                    reason: "failed to find it in the structure set".into(),
                }
                .into());
            }
            return Ok(StructureCreation {
                id: self.id.clone(),
                outcome: CreationOutcome::Missing,
                diagnostics,
            });
        }

        diagnostics.push(format!("Created/added {}", self.id));
        info!(
            structure_id = %self.id,
            dicom_type = %self.dicom_type,
            structure_set = %structure_set,
            "created structure"
        );
        Ok(StructureCreation {
            id: self.id.clone(),
            outcome: CreationOutcome::Created,
            diagnostics,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{RtStructError, StoreError};
    use crate::math::ImageGeometry;
    use crate::store::{MemoryStructure, MemoryStructureSet, Structure};

    fn set() -> MemoryStructureSet {
        let mut ss = MemoryStructureSet::new("CT_1", Some(ImageGeometry::new(0.0, 3.0)));
        ss.insert(MemoryStructure::new("Bladder", "ORGAN"));
        ss
    }

    /// Accepts every create call but never stores anything.
    struct ForgetfulSet(MemoryStructureSet);

    impl StructureSet for ForgetfulSet {
        fn id(&self) -> &str {
            self.0.id()
        }

        fn image(&self) -> Option<ImageGeometry> {
            self.0.image()
        }

        fn structure_ids(&self) -> Vec<String> {
            self.0.structure_ids()
        }

        fn structure(&self, id: &str) -> Option<&dyn Structure> {
            self.0.structure(id)
        }

        fn structure_mut(&mut self, id: &str) -> Option<&mut dyn Structure> {
            self.0.structure_mut(id)
        }

        fn can_add_structure(&self, _dicom_type: &str, _id: &str) -> bool {
            true
        }

        fn add_structure(
            &mut self,
            _dicom_type: &str,
            _id: &str,
        ) -> std::result::Result<Option<&mut dyn Structure>, StoreError> {
            Ok(None)
        }
    }

    #[test]
    fn creates_and_verifies_new_structure() {
        let mut ss = set();
        let created = AddStructure::new("ORGAN", "Rectum").execute(&mut ss).unwrap();
        assert_eq!(created.outcome, CreationOutcome::Created);
        assert_eq!(created.structure_id(), Some("Rectum"));
        assert_eq!(created.diagnostics, vec!["Created/added Rectum".to_string()]);
        assert!(ss.find("Rectum").is_some());
    }

    #[test]
    fn over_length_id_fails_before_store_call() {
        let mut ss = set();
        let id = "ABCDEFGHIJKLMNOPQ";
        let err = AddStructure::new("ORGAN", id).execute(&mut ss).unwrap_err();
        match err {
            RtStructError::Validation(ValidationError::IdTooLong { id: bad, length, max }) => {
                assert_eq!(bad, id);
                assert_eq!(length, 17);
                assert_eq!(max, 16);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(ss.len(), 1);
    }

    #[test]
    fn empty_id_and_type_are_rejected() {
        let mut ss = set();
        assert!(matches!(
            AddStructure::new("ORGAN", "").execute(&mut ss).unwrap_err(),
            RtStructError::Validation(ValidationError::EmptyId)
        ));
        assert!(matches!(
            AddStructure::new("", "Rectum").execute(&mut ss).unwrap_err(),
            RtStructError::Validation(ValidationError::EmptyType)
        ));
    }

    #[test]
    fn existing_id_needs_overwrite() {
        let mut ss = set();
        let err = AddStructure::new("ORGAN", "BLADDER").execute(&mut ss).unwrap_err();
        match err {
            RtStructError::Structure(e @ StructureError::AlreadyExists { .. }) => {
                assert_eq!(e.structure_id(), "BLADDER");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let reused = AddStructure::new("ORGAN", "BLADDER")
            .with_options(CreateOptions {
                overwrite: true,
                ..CreateOptions::default()
            })
            .execute(&mut ss)
            .unwrap();
        assert_eq!(reused.outcome, CreationOutcome::Reused);
        assert_eq!(reused.id, "Bladder");
        assert_eq!(ss.len(), 1);
    }

    #[test]
    fn store_rejection_is_chained() {
        let mut ss = set().with_capacity_limit(1);
        let err = AddStructure::new("ORGAN", "Rectum").execute(&mut ss).unwrap_err();
        match err {
            RtStructError::Structure(e @ StructureError::Store { .. }) => {
                assert_eq!(e.structure_id(), "Rectum");
                assert!(std::error::Error::source(&e).is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_result_depends_on_error_on_missing() {
        let mut ss = ForgetfulSet(set());
        let lenient = AddStructure::new("ORGAN", "Rectum").execute(&mut ss).unwrap();
        assert_eq!(lenient.outcome, CreationOutcome::Missing);
        assert_eq!(lenient.structure_id(), None);
        assert_eq!(
            lenient.diagnostics,
            vec!["Testing structure was null when creating Rectum".to_string()]
        );

        let err = AddStructure::new("ORGAN", "Rectum")
            .with_options(CreateOptions {
                error_on_missing: true,
                ..CreateOptions::default()
            })
            .execute(&mut ss)
            .unwrap_err();
        assert!(matches!(
            err,
            RtStructError::Structure(StructureError::CreationFailed { .. })
        ));
    }
}
