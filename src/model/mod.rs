//! In-memory slice/contour model of a structure.
//!
//! ```text
//! StructureModel ──* Slice ──* Contour ──* Point3
//!        │
//!        └─ snapshot of the store: StructureInfo, bounds, image geometry
//! ```

mod contour;
mod info;
mod slice;
mod structure;

pub(crate) use contour::fixed2;
pub use contour::{Contour, DEFAULT_POINT_DELIMITER};
pub use info::StructureInfo;
pub use slice::Slice;
pub use structure::{SliceLocator, StructureModel};
