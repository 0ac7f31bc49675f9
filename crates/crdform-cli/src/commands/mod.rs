//! CLI commands

use std::io::Read;
use std::path::Path;

use crdform_core::TypeKind;
use crdform_core::target::MANIFEST_SUFFIX;
use serde_json::Value;

use crate::error::{CliError, Result};

// Offline commands
pub mod render;
pub mod schema;
pub mod types;
pub mod validate;

// Cluster commands
pub mod apply;
pub mod delete;
pub mod get;
pub mod import;

/// Which variant of a type name a command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum KindArg {
    #[default]
    Resource,
    DataSource,
    Manifest,
}

impl From<KindArg> for TypeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Resource => TypeKind::Resource,
            KindArg::DataSource => TypeKind::DataSource,
            KindArg::Manifest => TypeKind::Manifest,
        }
    }
}

/// Accept both `k8s_x_v1` and `k8s_x_v1_manifest`
pub fn manifest_type_name(type_name: &str) -> String {
    let suffix = format!("_{}", MANIFEST_SUFFIX);
    if type_name.ends_with(&suffix) {
        type_name.to_string()
    } else {
        format!("{}{}", type_name, suffix)
    }
}

/// Type name as registered for `kind`
pub fn kind_type_name(type_name: &str, kind: KindArg) -> String {
    match kind {
        KindArg::Manifest => manifest_type_name(type_name),
        KindArg::Resource | KindArg::DataSource => type_name.to_string(),
    }
}

/// Read a YAML or JSON configuration document; `-` reads stdin
pub fn read_document(path: &Path) -> Result<Value> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|e| CliError::Io {
            message: format!("{}: {}", path.display(), e),
        })?
    };

    serde_yaml::from_str(&content).map_err(|e| {
        CliError::validation_with_help(
            format!("{} is not a valid YAML document: {}", path.display(), e),
            "configuration documents use snake_case attribute names, e.g. `metadata.name`",
        )
    })
}

/// Build the `metadata` block addressed by an id
pub fn metadata_for(namespace: Option<String>, name: String) -> Value {
    let mut metadata = serde_json::Map::new();
    metadata.insert("name".to_string(), Value::String(name));
    if let Some(namespace) = namespace {
        metadata.insert("namespace".to_string(), Value::String(namespace));
    }
    serde_json::json!({ "metadata": metadata })
}
