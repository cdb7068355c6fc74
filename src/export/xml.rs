use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use super::{ExportOptions, Exporter};
use crate::error::{ExportError, Result};
use crate::model::{fixed2, StructureModel};
use crate::store::StructureSet;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>"#;
const FORMAT_VERSION: &str = "1";

/// A minimal element tree; attributes keep insertion order.
#[derive(Debug, Clone)]
struct Element {
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    fn write(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}<{}", self.name);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}=\"{}\"", escape(value));
        }
        match (&self.text, self.children.is_empty()) {
            (None, true) => out.push_str(" />\n"),
            (Some(text), true) => {
                let _ = writeln!(out, ">{}</{}>", escape(text), self.name);
            }
            (text, false) => {
                out.push_str(">\n");
                if let Some(text) = text {
                    let _ = writeln!(out, "{indent}  {}", escape(text));
                }
                for child in &self.children {
                    child.write(out, depth + 1);
                }
                let _ = writeln!(out, "{indent}</{}>", self.name);
            }
        }
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders structures as an XML document.
///
/// ```text
/// <StructureSet version="1" SetID="CT_1">
///   <Structure Id="Cord">
///     <Slice z="5.00" nContours="1">
///       <Contour nPoints="4">0.00, 0.00 | 5.00, 0.00 | ...</Contour>
/// ```
#[derive(Debug, Default)]
pub struct XmlExporter {
    options: ExportOptions,
    set_id: Option<String>,
    structures: Vec<Element>,
}

impl XmlExporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: ExportOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    fn structure_element(&self, model: &StructureModel) -> Element {
        let mut structure = Element::new("Structure").attr("Id", model.id());
        for slice in model {
            let mut slice_node = Element::new("Slice")
                .attr("z", fixed2(slice.z_location()))
                .attr("nContours", slice.len().to_string());
            for contour in slice {
                let mut contour_node =
                    Element::new("Contour").attr("nPoints", contour.len().to_string());
                contour_node.text = Some(contour.render(&self.options.contour_delimiter));
                slice_node.children.push(contour_node);
            }
            structure.children.push(slice_node);
        }
        structure
    }
}

impl Exporter for XmlExporter {
    fn export_structure(&mut self, set: &dyn StructureSet, structure_id: &str) -> Result<()> {
        let model = StructureModel::build(set, structure_id)?;
        self.set_id = Some(set.id().to_owned());
        let element = self.structure_element(&model);
        self.structures.push(element);
        debug!(structure_id, slices = model.len(), "exported structure to xml");
        Ok(())
    }

    fn export_structures(&mut self, set: &dyn StructureSet) -> Result<()> {
        self.set_id = Some(set.id().to_owned());
        for id in set.structure_ids() {
            self.export_structure(set, &id)?;
        }
        Ok(())
    }

    fn contents(&self) -> String {
        let mut root = Element::new("StructureSet").attr("version", FORMAT_VERSION);
        if let Some(set_id) = &self.set_id {
            root = root.attr("SetID", set_id.as_str());
        }
        root.children.clone_from(&self.structures);

        let mut out = String::new();
        out.push_str(DECLARATION);
        out.push('\n');
        root.write(&mut out, 0);
        out
    }

    fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.contents()).map_err(ExportError::from)?;
        Ok(())
    }
}
