//! crdform Core - types shared by every crdform crate
//!
//! This crate provides:
//! - `CrdType`: API coordinates (group, version, kind, plural, scope) and
//!   provider naming of one custom resource version
//! - `Object`: the typed object exchanged with the API server
//! - `crd`: CustomResourceDefinition parsing
//! - `Schema`: declarative provider schemas derived from OpenAPI schemas
//! - `TypeRegistry`: the set of types the provider serves
//! - Manifest rendering, configuration validation and state conversion

pub mod convert;
pub mod crd;
pub mod error;
pub mod manifest;
pub mod naming;
pub mod object;
pub mod registry;
pub mod schema;
pub mod target;
pub mod validate;

pub use convert::{object_to_state, state_to_object};
pub use crd::{CrdDefinition, CrdParser, CrdVersion};
pub use error::{CoreError, Result};
pub use manifest::{parse_manifest, render_manifest};
pub use object::{CrdModel, Object, ObjectMeta};
pub use registry::{RegisteredType, TypeRegistry};
pub use schema::{Attribute, AttributeMode, AttributeType, Schema, SchemaBuilder, Validator};
pub use target::{CrdScope, CrdType, IdFormat, TypeKind};
pub use validate::{ValidationIssue, validate_config};
