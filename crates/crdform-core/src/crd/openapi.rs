//! CRD definition and OpenAPI v3 schema representation
//!
//! Only the parts of a CustomResourceDefinition that drive the provider
//! surface are kept: names, scope, served versions and their schemas.

use std::collections::BTreeMap;

use crate::target::{CrdScope, CrdType, IdFormat};

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdDefinition {
    /// Full CRD name (e.g., "certificates.cert-manager.io")
    pub name: String,
    /// API group (e.g., "cert-manager.io")
    pub group: String,
    pub scope: CrdScope,
    pub names: CrdNames,
    pub versions: Vec<CrdVersion>,
}

impl CrdDefinition {
    /// Get all served versions
    pub fn served_versions(&self) -> impl Iterator<Item = &CrdVersion> {
        self.versions.iter().filter(|v| v.served)
    }

    /// API coordinates of every served version
    pub fn crd_types(&self, id_format: IdFormat) -> impl Iterator<Item = (CrdType, &CrdVersion)> {
        self.served_versions().map(move |v| {
            let crd_type = CrdType::new(
                self.group.clone(),
                v.name.clone(),
                self.names.kind.clone(),
                self.names.plural.clone(),
            )
            .with_scope(self.scope)
            .with_id_format(id_format);
            (crd_type, v)
        })
    }
}

/// CRD naming information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    /// Kind (e.g., "Certificate")
    pub kind: String,
    /// Plural name (e.g., "certificates")
    pub plural: String,
}

/// A single API version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersion {
    /// Version name (e.g., "v1", "v1beta1")
    pub name: String,
    pub served: bool,
    pub storage: bool,
    pub deprecated: bool,
    pub deprecation_warning: Option<String>,
    /// OpenAPI v3 schema of the whole object
    pub schema: Option<SchemaProperty>,
}

impl CrdVersion {
    /// Root properties other than the ones every object shares
    ///
    /// Usually just `spec`; some CRDs declare other top-level fields.
    pub fn body_properties(&self) -> impl Iterator<Item = (&String, &SchemaProperty)> {
        self.schema
            .iter()
            .filter_map(|s| s.properties.as_ref())
            .flat_map(|props| props.iter())
            .filter(|(name, _)| !matches!(name.as_str(), "apiVersion" | "kind" | "metadata" | "status"))
    }
}

/// Schema for a single property
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaProperty {
    pub type_: PropertyType,
    pub description: Option<String>,
    /// Regex pattern for strings
    pub pattern: Option<String>,
    /// Allowed values (enum)
    pub enum_values: Option<Vec<serde_json::Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    /// Nested object properties
    pub properties: Option<BTreeMap<String, SchemaProperty>>,
    /// Required nested properties
    pub required: Option<Vec<String>>,
    /// Array item schema
    pub items: Option<Box<SchemaProperty>>,
    /// Additional properties for objects (maps)
    pub additional_properties: Option<AdditionalProperties>,
    /// x-kubernetes-preserve-unknown-fields
    pub x_preserve_unknown: bool,
    /// x-kubernetes-embedded-resource
    pub x_embedded_resource: bool,
    /// x-kubernetes-int-or-string
    pub x_int_or_string: bool,
}

impl SchemaProperty {
    pub fn string() -> Self {
        Self {
            type_: PropertyType::String,
            ..Default::default()
        }
    }

    pub fn integer() -> Self {
        Self {
            type_: PropertyType::Integer,
            ..Default::default()
        }
    }

    pub fn boolean() -> Self {
        Self {
            type_: PropertyType::Boolean,
            ..Default::default()
        }
    }

    pub fn object(properties: BTreeMap<String, SchemaProperty>) -> Self {
        Self {
            type_: PropertyType::Object,
            properties: Some(properties),
            ..Default::default()
        }
    }

    pub fn array(items: SchemaProperty) -> Self {
        Self {
            type_: PropertyType::Array,
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Object whose values all follow one schema
    pub fn map(values: SchemaProperty) -> Self {
        Self {
            type_: PropertyType::Object,
            additional_properties: Some(AdditionalProperties::Schema(Box::new(values))),
            ..Default::default()
        }
    }

    /// Builder: mark nested properties as required
    pub fn with_required(mut self, required: &[&str]) -> Self {
        self.required = Some(required.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn has_nested_properties(&self) -> bool {
        self.properties.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|r| r.iter().any(|n| n == name))
    }
}

/// Property type in OpenAPI schema
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    #[default]
    Object,
    /// Unknown or unspecified type
    Unknown(String),
}

impl PropertyType {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Additional properties configuration for objects
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    #[default]
    Allowed,
    Denied,
    /// Additional properties must match a schema
    Schema(Box<SchemaProperty>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(name: &str, served: bool, storage: bool) -> CrdVersion {
        CrdVersion {
            name: name.to_string(),
            served,
            storage,
            deprecated: false,
            deprecation_warning: None,
            schema: None,
        }
    }

    #[test]
    fn test_schema_property_nested() {
        let mut nested = BTreeMap::new();
        nested.insert("replicas".to_string(), SchemaProperty::integer());
        nested.insert("image".to_string(), SchemaProperty::string());

        let spec = SchemaProperty::object(nested).with_required(&["replicas"]);

        assert!(spec.has_nested_properties());
        assert!(spec.is_required("replicas"));
        assert!(!spec.is_required("image"));
    }

    #[test]
    fn test_crd_types_only_served_versions() {
        let crd = CrdDefinition {
            name: "widgets.example.com".to_string(),
            group: "example.com".to_string(),
            scope: CrdScope::Cluster,
            names: CrdNames {
                kind: "Widget".to_string(),
                plural: "widgets".to_string(),
            },
            versions: vec![
                version("v1", true, true),
                version("v1beta1", true, false),
                version("v1alpha1", false, false),
            ],
        };

        let types: Vec<_> = crd.crd_types(IdFormat::default()).map(|(t, _)| t).collect();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].version, "v1");
        assert_eq!(types[0].scope, CrdScope::Cluster);
        assert_eq!(types[1].plural, "widgets");
    }

    #[test]
    fn test_body_properties_skip_common_fields() {
        let mut root = BTreeMap::new();
        for key in ["apiVersion", "kind", "metadata", "spec", "status", "data"] {
            root.insert(key.to_string(), SchemaProperty::default());
        }
        let mut v = version("v1", true, true);
        v.schema = Some(SchemaProperty::object(root));

        let names: Vec<_> = v.body_properties().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["data", "spec"]);
    }
}
