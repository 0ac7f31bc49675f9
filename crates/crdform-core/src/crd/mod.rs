//! CustomResourceDefinition handling
//!
//! - **Definition types** (`openapi`): names, scope, versions and the OpenAPI
//!   v3 schema of each version
//! - **Parsing** (`parser`): CRD YAML (single or multi-document) into
//!   definitions

mod openapi;
mod parser;

pub use openapi::{
    AdditionalProperties, CrdDefinition, CrdNames, CrdVersion, PropertyType, SchemaProperty,
};
pub use parser::CrdParser;
