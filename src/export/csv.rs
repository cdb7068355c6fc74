use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use super::{ExportOptions, Exporter};
use crate::error::{ExportError, Result};
use crate::model::StructureModel;
use crate::store::StructureSet;

/// Renders structures as delimited text.
///
/// ```text
/// Set ID,CT_1
/// Structure ID,Cord
/// Z,5
/// nContours,1
/// 0.00, 0.00,5.00, 0.00,5.00, 5.00
/// ```
#[derive(Debug, Default)]
pub struct CsvExporter {
    options: ExportOptions,
    buffer: String,
}

impl CsvExporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: ExportOptions) -> Self {
        Self {
            options,
            buffer: String::new(),
        }
    }
}

impl Exporter for CsvExporter {
    fn export_structure(&mut self, set: &dyn StructureSet, structure_id: &str) -> Result<()> {
        let model = StructureModel::build(set, structure_id)?;
        let _ = writeln!(self.buffer, "{}", model.render(&self.options.csv_delimiter));
        debug!(structure_id, slices = model.len(), "exported structure to csv");
        Ok(())
    }

    fn export_structures(&mut self, set: &dyn StructureSet) -> Result<()> {
        let _ = writeln!(self.buffer, "Set ID{}{}", self.options.csv_delimiter, set.id());
        for id in set.structure_ids() {
            self.export_structure(set, &id)?;
        }
        Ok(())
    }

    fn contents(&self) -> String {
        self.buffer.clone()
    }

    fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, format!("{}\n", self.buffer)).map_err(ExportError::from)?;
        Ok(())
    }
}
