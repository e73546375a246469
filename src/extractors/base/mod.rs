// Base extractor types for DocuAgent
//
// - types.rs: the component model (Module, Class, Function, Method, Property, Parameter)
// - extractor.rs: BaseExtractor (node text, declaration slices, identifiers)

pub mod extractor;
pub mod types;

// Re-export key types for external use
pub use extractor::{generate_id, BaseExtractor, ID_LENGTH};
pub use types::{
    find_component, Class, Component, ComponentKind, ComponentRef, Function, Method, Module,
    Parameter, Property,
};
