mod add_structure;
mod clone_structure;

pub use add_structure::{
    validate_structure_id, AddStructure, CreateOptions, CreationOutcome, StructureCreation,
    DEFAULT_MAX_ID_LENGTH,
};
pub use clone_structure::CloneStructure;
