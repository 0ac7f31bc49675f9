//! Declarative provider schemas
//!
//! Every registered type exposes three schemas (resource, data source,
//! manifest) built from the CRD's OpenAPI v3 schema. Attribute names are
//! snake_case; the JSON name each attribute maps to is kept alongside so
//! state can be converted back into an object.

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::crd::{AdditionalProperties, CrdVersion, PropertyType, SchemaProperty};
use crate::naming::to_snake_case;
use crate::target::{CrdType, TypeKind};

/// Allowed values of `deletion_propagation`
pub const DELETION_PROPAGATION_POLICIES: &[&str] = &["Orphan", "Background", "Foreground"];

/// Attribute value type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "element")]
pub enum AttributeType {
    String,
    Int64,
    Number,
    Bool,
    /// Any JSON value, passed through untouched
    Dynamic,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
    /// Nested attributes
    Object(IndexMap<String, Attribute>),
}

impl AttributeType {
    /// Nested attributes of an object (or of list/map elements that are objects)
    pub fn nested(&self) -> Option<&IndexMap<String, Attribute>> {
        match self {
            Self::Object(attrs) => Some(attrs),
            Self::List(inner) | Self::Map(inner) => inner.nested(),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Int64 => "int64".to_string(),
            Self::Number => "number".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Dynamic => "dynamic".to_string(),
            Self::List(inner) => format!("list({})", inner.describe()),
            Self::Map(inner) => format!("map({})", inner.describe()),
            Self::Object(_) => "object".to_string(),
        }
    }
}

/// Whether the practitioner must, may, or cannot set an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMode {
    Required,
    Optional,
    Computed,
}

/// Value constraints checked during configuration validation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Validator {
    LengthAtLeast(u64),
    LengthAtMost(u64),
    OneOf(Vec<String>),
    Matches(String),
    AtLeast(f64),
    AtMost(f64),
    SizeAtLeast(u64),
    SizeAtMost(u64),
}

impl Validator {
    /// Check a value, returning a human-readable message on failure
    ///
    /// Values of a type the validator does not apply to pass; type checking
    /// is done separately.
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match (self, value) {
            (Self::LengthAtLeast(min), Value::String(s)) if (s.chars().count() as u64) < *min => {
                Err(format!("string length must be at least {}, got {}", min, s.chars().count()))
            }
            (Self::LengthAtMost(max), Value::String(s)) if (s.chars().count() as u64) > *max => {
                Err(format!("string length must be at most {}, got {}", max, s.chars().count()))
            }
            (Self::OneOf(allowed), Value::String(s)) if !allowed.iter().any(|a| a == s) => Err(
                format!("value must be one of: {}, got \"{}\"", allowed.join(", "), s),
            ),
            (Self::Matches(pattern), Value::String(s)) => match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    Err(format!("value must match pattern '{}', got \"{}\"", pattern, s))
                }
                _ => Ok(()),
            },
            (Self::AtLeast(min), Value::Number(n)) if n.as_f64().is_some_and(|v| v < *min) => {
                Err(format!("value must be at least {}, got {}", min, n))
            }
            (Self::AtMost(max), Value::Number(n)) if n.as_f64().is_some_and(|v| v > *max) => {
                Err(format!("value must be at most {}, got {}", max, n))
            }
            (Self::SizeAtLeast(min), Value::Array(items)) if (items.len() as u64) < *min => {
                Err(format!("list must contain at least {} elements, got {}", min, items.len()))
            }
            (Self::SizeAtMost(max), Value::Array(items)) if (items.len() as u64) > *max => {
                Err(format!("list must contain at most {} elements, got {}", max, items.len()))
            }
            _ => Ok(()),
        }
    }
}

/// One attribute of a schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// JSON field name this attribute maps to; `None` for provider-only
    /// attributes (`id`, `yaml`, `force_conflicts`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub type_: AttributeType,
    pub mode: AttributeMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl Attribute {
    pub fn new(type_: AttributeType, mode: AttributeMode) -> Self {
        Self {
            json_name: None,
            description: None,
            type_,
            mode,
            validators: Vec::new(),
        }
    }

    pub fn required_string() -> Self {
        Self::new(AttributeType::String, AttributeMode::Required)
    }

    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, AttributeMode::Optional)
    }

    pub fn computed_string() -> Self {
        Self::new(AttributeType::String, AttributeMode::Computed)
    }

    pub fn with_json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = Some(json_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn is_required(&self) -> bool {
        self.mode == AttributeMode::Required
    }

    pub fn is_computed(&self) -> bool {
        self.mode == AttributeMode::Computed
    }
}

/// Schema of one registered type name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub type_name: String,
    pub kind: TypeKind,
    pub description: String,
    pub attributes: IndexMap<String, Attribute>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Look up a nested attribute by dot-separated path (`metadata.name`)
    pub fn attribute_at(&self, path: &str) -> Option<&Attribute> {
        let mut parts = path.split('.');
        let mut current = self.attributes.get(parts.next()?)?;
        for part in parts {
            current = current.type_.nested()?.get(part)?;
        }
        Some(current)
    }
}

/// Builds the three schemas of one CRD version
pub struct SchemaBuilder<'a> {
    crd_type: &'a CrdType,
    version: Option<&'a CrdVersion>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(crd_type: &'a CrdType, version: Option<&'a CrdVersion>) -> Self {
        Self { crd_type, version }
    }

    pub fn build(&self, kind: TypeKind) -> Schema {
        let mut attributes = IndexMap::new();

        let id_description = if self.crd_type.scope.is_namespaced() {
            match self.crd_type.id_format {
                crate::target::IdFormat::NamespaceName => {
                    "Contains the value `metadata.namespace/metadata.name`."
                }
                crate::target::IdFormat::NameNamespace => {
                    "Contains the value `metadata.name/metadata.namespace`."
                }
            }
        } else {
            "Contains the value `metadata.name`."
        };
        attributes.insert(
            "id".to_string(),
            Attribute::computed_string().with_description(id_description),
        );
        attributes.insert(
            "api_version".to_string(),
            Attribute::computed_string()
                .with_json_name("apiVersion")
                .with_description("The API group and version of this object."),
        );
        attributes.insert(
            "kind".to_string(),
            Attribute::computed_string()
                .with_json_name("kind")
                .with_description("The kind of this object."),
        );
        attributes.insert("metadata".to_string(), self.metadata_attribute(kind));

        let settings = provider_attributes(kind);
        for (json_name, prop) in self.version.into_iter().flat_map(|v| v.body_properties()) {
            let root_required = self
                .version
                .and_then(|v| v.schema.as_ref())
                .is_some_and(|s| s.is_required(json_name));
            let attribute = property_attribute(json_name, prop, root_required, kind);
            let name = unique_name(to_snake_case(json_name), |n| {
                attributes.contains_key(n) || settings.contains_key(n)
            });
            attributes.insert(name, attribute);
        }
        attributes.extend(settings);

        Schema {
            type_name: self.crd_type.type_name(kind),
            kind,
            description: self.description(kind),
            attributes,
        }
    }

    fn description(&self, kind: TypeKind) -> String {
        let base = self
            .version
            .and_then(|v| v.schema.as_ref())
            .and_then(|s| s.description.clone())
            .unwrap_or_else(|| format!("{} of {}", self.crd_type.kind, self.crd_type.api_version()));
        match kind {
            TypeKind::Resource => base,
            TypeKind::DataSource => format!("Reads an existing {}. {}", self.crd_type.kind, base),
            TypeKind::Manifest => format!("Renders a {} manifest. {}", self.crd_type.kind, base),
        }
    }

    fn metadata_attribute(&self, kind: TypeKind) -> Attribute {
        let map_mode = if kind == TypeKind::DataSource {
            AttributeMode::Computed
        } else {
            AttributeMode::Optional
        };

        let mut nested = IndexMap::new();
        nested.insert(
            "name".to_string(),
            Attribute::required_string()
                .with_json_name("name")
                .with_description("Unique name of this object.")
                .with_validator(Validator::LengthAtLeast(1)),
        );
        if self.crd_type.scope.is_namespaced() {
            nested.insert(
                "namespace".to_string(),
                Attribute::required_string()
                    .with_json_name("namespace")
                    .with_description("Namespace that contains this object.")
                    .with_validator(Validator::LengthAtLeast(1)),
            );
        }
        nested.insert(
            "labels".to_string(),
            Attribute::new(AttributeType::Map(Box::new(AttributeType::String)), map_mode)
                .with_json_name("labels")
                .with_description("Map of string keys and values used to organize objects."),
        );
        nested.insert(
            "annotations".to_string(),
            Attribute::new(AttributeType::Map(Box::new(AttributeType::String)), map_mode)
                .with_json_name("annotations")
                .with_description("Unstructured key value map stored with the object."),
        );

        Attribute::new(AttributeType::Object(nested), AttributeMode::Required)
            .with_json_name("metadata")
            .with_description("Data that helps uniquely identify this object.")
    }
}

/// Provider-only attributes of a variant, listed after the CRD's own fields
fn provider_attributes(kind: TypeKind) -> IndexMap<String, Attribute> {
    let mut attributes = IndexMap::new();
    match kind {
        TypeKind::Resource => {
            attributes.insert(
                "force_conflicts".to_string(),
                Attribute::new(AttributeType::Bool, AttributeMode::Optional).with_description(
                    "If 'true', server-side apply will force the changes against conflicts.",
                ),
            );
            attributes.insert(
                "field_manager".to_string(),
                Attribute::optional_string()
                    .with_description("The name of the manager used to track field ownership.")
                    .with_validator(Validator::LengthAtLeast(1)),
            );
            attributes.insert(
                "deletion_propagation".to_string(),
                Attribute::optional_string()
                    .with_description("Decides whether and how garbage collection will be performed.")
                    .with_validator(Validator::OneOf(
                        DELETION_PROPAGATION_POLICIES.iter().map(|s| s.to_string()).collect(),
                    )),
            );
        }
        TypeKind::Manifest => {
            attributes.insert(
                "yaml".to_string(),
                Attribute::computed_string()
                    .with_description("The generated manifest in YAML format."),
            );
        }
        TypeKind::DataSource => {}
    }
    attributes
}

/// `name`, or `name_2`, `name_3`, ... if already taken
fn unique_name(name: String, taken: impl Fn(&str) -> bool) -> String {
    if !taken(&name) {
        return name;
    }
    let mut suffix = 2;
    while taken(&format!("{}_{}", name, suffix)) {
        suffix += 1;
    }
    tracing::debug!(attribute = %name, suffix, "attribute name collision");
    format!("{}_{}", name, suffix)
}

/// Convert one OpenAPI property (and its children) into an attribute
fn property_attribute(
    json_name: &str,
    prop: &SchemaProperty,
    required: bool,
    kind: TypeKind,
) -> Attribute {
    let mode = match (kind, required) {
        (TypeKind::DataSource, _) => AttributeMode::Computed,
        (_, true) => AttributeMode::Required,
        (_, false) => AttributeMode::Optional,
    };

    let mut attribute = Attribute::new(property_type(prop, kind), mode).with_json_name(json_name);
    attribute.description = prop.description.clone();
    if kind != TypeKind::DataSource {
        attribute.validators = property_validators(prop);
    }
    attribute
}

fn property_type(prop: &SchemaProperty, kind: TypeKind) -> AttributeType {
    if prop.x_int_or_string || prop.x_embedded_resource {
        return AttributeType::Dynamic;
    }

    match &prop.type_ {
        PropertyType::String => AttributeType::String,
        PropertyType::Integer => AttributeType::Int64,
        PropertyType::Number => AttributeType::Number,
        PropertyType::Boolean => AttributeType::Bool,
        PropertyType::Array => {
            let element = prop
                .items
                .as_deref()
                .map(|items| property_type(items, kind))
                .unwrap_or(AttributeType::Dynamic);
            AttributeType::List(Box::new(element))
        }
        PropertyType::Object if prop.has_nested_properties() && !prop.x_preserve_unknown => {
            let mut nested = IndexMap::new();
            for (json_name, child) in prop.properties.iter().flatten() {
                let attribute =
                    property_attribute(json_name, child, prop.is_required(json_name), kind);
                let name = unique_name(to_snake_case(json_name), |n| nested.contains_key(n));
                nested.insert(name, attribute);
            }
            AttributeType::Object(nested)
        }
        PropertyType::Object => match &prop.additional_properties {
            Some(AdditionalProperties::Schema(values)) if !prop.x_preserve_unknown => {
                AttributeType::Map(Box::new(property_type(values, kind)))
            }
            _ => AttributeType::Dynamic,
        },
        PropertyType::Unknown(_) => AttributeType::Dynamic,
    }
}

fn property_validators(prop: &SchemaProperty) -> Vec<Validator> {
    let mut validators = Vec::new();

    if let Some(values) = &prop.enum_values {
        let allowed: Vec<String> = values
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect();
        if !allowed.is_empty() && allowed.len() == values.len() {
            validators.push(Validator::OneOf(allowed));
        }
    }
    if let Some(pattern) = &prop.pattern {
        // CRD patterns are ECMA-262; skip the ones the regex crate rejects
        if Regex::new(pattern).is_ok() {
            validators.push(Validator::Matches(pattern.clone()));
        } else {
            tracing::debug!(%pattern, "skipping unsupported pattern");
        }
    }
    if let Some(min) = prop.min_length {
        validators.push(Validator::LengthAtLeast(min));
    }
    if let Some(max) = prop.max_length {
        validators.push(Validator::LengthAtMost(max));
    }
    if let Some(min) = prop.minimum {
        validators.push(Validator::AtLeast(min));
    }
    if let Some(max) = prop.maximum {
        validators.push(Validator::AtMost(max));
    }
    if let Some(min) = prop.min_items {
        validators.push(Validator::SizeAtLeast(min));
    }
    if let Some(max) = prop.max_items {
        validators.push(Validator::SizeAtMost(max));
    }

    validators
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::CrdParser;
    use crate::target::{CrdScope, IdFormat};
    use serde_json::json;

    const WIDGET_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
    plural: widgets
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          required: [spec]
          properties:
            spec:
              type: object
              required: [size]
              properties:
                size:
                  type: integer
                  minimum: 1
                podCIDR:
                  type: string
                mode:
                  type: string
                  enum: [fast, slow]
                hosts:
                  type: array
                  items:
                    type: object
                    properties:
                      hostName:
                        type: string
                selector:
                  type: object
                  additionalProperties:
                    type: string
                config:
                  type: object
                  x-kubernetes-preserve-unknown-fields: true
                port:
                  x-kubernetes-int-or-string: true
            status:
              type: object
"#;

    fn widget() -> (CrdType, CrdVersion) {
        let crd = CrdParser::parse(WIDGET_CRD).unwrap();
        let (crd_type, version) = crd.crd_types(IdFormat::default()).next().unwrap();
        (crd_type, version.clone())
    }

    #[test]
    fn test_common_attributes() {
        let (crd_type, version) = widget();
        let schema = SchemaBuilder::new(&crd_type, Some(&version)).build(TypeKind::Resource);

        assert_eq!(schema.type_name, "k8s_example_com_widget_v1");
        let names: Vec<_> = schema.attributes.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "id",
                "api_version",
                "kind",
                "metadata",
                "spec",
                "force_conflicts",
                "field_manager",
                "deletion_propagation"
            ]
        );
        assert!(schema.attribute("id").unwrap().is_computed());
        assert!(schema.attribute_at("metadata.name").unwrap().is_required());
        assert!(schema.attribute_at("metadata.namespace").unwrap().is_required());
        assert!(schema.attribute("spec").unwrap().is_required());
        assert!(schema.attribute("status").is_none());
    }

    #[test]
    fn test_crd_fields_never_shadowed_by_provider_attributes() {
        let mut root = std::collections::BTreeMap::new();
        root.insert("spec".to_string(), SchemaProperty::default());
        root.insert("fieldManager".to_string(), SchemaProperty::string());
        root.insert("yaml".to_string(), SchemaProperty::string());
        let version = CrdVersion {
            name: "v1".to_string(),
            served: true,
            storage: true,
            deprecated: false,
            deprecation_warning: None,
            schema: Some(SchemaProperty::object(root)),
        };
        let crd_type = CrdType::new("example.com", "v1", "Gadget", "gadgets");

        let schema = SchemaBuilder::new(&crd_type, Some(&version)).build(TypeKind::Resource);
        assert_eq!(
            schema.attribute("field_manager_2").unwrap().json_name.as_deref(),
            Some("fieldManager")
        );
        assert!(schema.attribute("field_manager").unwrap().json_name.is_none());

        let schema = SchemaBuilder::new(&crd_type, Some(&version)).build(TypeKind::Manifest);
        assert_eq!(schema.attribute("yaml_2").unwrap().json_name.as_deref(), Some("yaml"));
        assert!(schema.attribute("yaml").unwrap().is_computed());
    }

    #[test]
    fn test_spec_attribute_types() {
        let (crd_type, version) = widget();
        let schema = SchemaBuilder::new(&crd_type, Some(&version)).build(TypeKind::Resource);

        let size = schema.attribute_at("spec.size").unwrap();
        assert_eq!(size.type_, AttributeType::Int64);
        assert!(size.is_required());
        assert_eq!(size.validators, vec![Validator::AtLeast(1.0)]);

        let cidr = schema.attribute_at("spec.pod_cidr").unwrap();
        assert_eq!(cidr.json_name.as_deref(), Some("podCIDR"));

        let mode = schema.attribute_at("spec.mode").unwrap();
        assert_eq!(
            mode.validators,
            vec![Validator::OneOf(vec!["fast".to_string(), "slow".to_string()])]
        );

        let host_name = schema.attribute_at("spec.hosts.host_name").unwrap();
        assert_eq!(host_name.type_, AttributeType::String);

        assert_eq!(
            schema.attribute_at("spec.selector").unwrap().type_,
            AttributeType::Map(Box::new(AttributeType::String))
        );
        assert_eq!(schema.attribute_at("spec.config").unwrap().type_, AttributeType::Dynamic);
        assert_eq!(schema.attribute_at("spec.port").unwrap().type_, AttributeType::Dynamic);
    }

    #[test]
    fn test_data_source_spec_is_computed() {
        let (crd_type, version) = widget();
        let schema = SchemaBuilder::new(&crd_type, Some(&version)).build(TypeKind::DataSource);

        assert!(schema.attribute("spec").unwrap().is_computed());
        assert!(schema.attribute_at("spec.size").unwrap().is_computed());
        assert!(schema.attribute_at("spec.size").unwrap().validators.is_empty());
        assert!(schema.attribute_at("metadata.labels").unwrap().is_computed());
        assert!(schema.attribute_at("metadata.name").unwrap().is_required());
        assert!(schema.attribute("force_conflicts").is_none());
    }

    #[test]
    fn test_manifest_has_yaml_output() {
        let (crd_type, version) = widget();
        let schema = SchemaBuilder::new(&crd_type, Some(&version)).build(TypeKind::Manifest);

        assert_eq!(schema.type_name, "k8s_example_com_widget_v1_manifest");
        assert!(schema.attribute("yaml").unwrap().is_computed());
    }

    #[test]
    fn test_cluster_scoped_has_no_namespace() {
        let crd_type = CrdType::new("example.com", "v1", "Gadget", "gadgets")
            .with_scope(CrdScope::Cluster);
        let schema = SchemaBuilder::new(&crd_type, None).build(TypeKind::Resource);

        assert!(schema.attribute_at("metadata.namespace").is_none());
        assert!(schema.attribute("spec").is_none());
        assert_eq!(
            schema.attribute("id").unwrap().description.as_deref(),
            Some("Contains the value `metadata.name`.")
        );
    }

    #[test]
    fn test_validators() {
        assert!(Validator::LengthAtLeast(1).check(&json!("")).is_err());
        assert!(Validator::LengthAtLeast(1).check(&json!("a")).is_ok());
        assert!(Validator::OneOf(vec!["a".into()]).check(&json!("b")).is_err());
        assert!(Validator::Matches("^[0-9]+h$".into()).check(&json!("12h")).is_ok());
        assert!(Validator::Matches("^[0-9]+h$".into()).check(&json!("12m")).is_err());
        assert!(Validator::AtMost(10.0).check(&json!(11)).is_err());
        assert!(Validator::SizeAtMost(1).check(&json!([1, 2])).is_err());
        // Validators ignore values of other types
        assert!(Validator::LengthAtLeast(5).check(&json!(1)).is_ok());
    }

    #[test]
    fn test_schema_serializes_for_display() {
        let crd_type = CrdType::new("example.com", "v1", "Gadget", "gadgets");
        let schema = SchemaBuilder::new(&crd_type, None).build(TypeKind::Manifest);
        let json = serde_json::to_value(&schema).unwrap();

        assert_eq!(json["kind"], "manifest");
        assert_eq!(json["attributes"]["yaml"]["mode"], "computed");
        assert_eq!(json["attributes"]["yaml"]["type"], "string");
        assert_eq!(json["attributes"]["metadata"]["type"], "object");
    }
}
