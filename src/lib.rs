//! Slice/contour model of radiotherapy structures.
//!
//! A [`StructureModel`] is built from a structure held by an external
//! [`StructureSet`] store and groups the structure's contours by axial image
//! plane. Contour edits made through the model are written to the store in
//! the same call. [`operations`] creates and clones store structures;
//! [`export`] renders whole structure sets as CSV or XML.

pub mod error;
pub mod export;
pub mod math;
pub mod model;
pub mod operations;
pub mod store;

pub use error::{Result, RtStructError};
pub use model::{Contour, Slice, SliceLocator, StructureModel};
pub use store::{Structure, StructureSet};
