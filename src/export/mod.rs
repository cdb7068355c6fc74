//! Text exporters for structure sets.
//!
//! Both exporters buffer everything in memory; nothing reaches the file
//! system until [`Exporter::save`] is called.

mod csv;
mod xml;

pub use csv::CsvExporter;
pub use xml::XmlExporter;

use std::path::Path;

use crate::error::Result;
use crate::model::DEFAULT_POINT_DELIMITER;
use crate::store::StructureSet;

/// Delimiters used when rendering structures to text.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Separates fields in CSV lines, including the points of a contour.
    pub csv_delimiter: String,
    /// Separates points in XML contour text.
    pub contour_delimiter: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            csv_delimiter: ",".into(),
            contour_delimiter: DEFAULT_POINT_DELIMITER.into(),
        }
    }
}

/// Accumulates structures as text and writes them out on demand.
pub trait Exporter {
    /// Appends one structure of `set`.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure cannot be read from the set.
    fn export_structure(&mut self, set: &dyn StructureSet, structure_id: &str) -> Result<()>;

    /// Appends every structure of `set`, in store order.
    ///
    /// # Errors
    ///
    /// Returns an error if any structure cannot be read from the set.
    fn export_structures(&mut self, set: &dyn StructureSet) -> Result<()>;

    /// The text that [`save`](Self::save) would write.
    fn contents(&self) -> String;

    /// Writes the buffered text to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`](crate::error::ExportError::Io) if the file
    /// cannot be written.
    fn save(&self, path: &Path) -> Result<()>;
}
