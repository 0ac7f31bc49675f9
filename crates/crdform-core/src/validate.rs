//! Configuration validation against a provider schema
//!
//! Runs before any cluster call. Configuration documents use the schema's
//! snake_case attribute names.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::schema::{Attribute, AttributeMode, AttributeType, Schema};

/// One problem found in a configuration document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Dot-separated attribute path (`metadata.name`, `spec.hosts[0].port`)
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration document against a schema
///
/// Returns every issue found; an empty vector means the document is valid.
pub fn validate_config(schema: &Schema, config: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    match config {
        Value::Object(map) => {
            validate_attributes(&schema.attributes, map, "", &mut issues);
        }
        other => issues.push(ValidationIssue {
            path: String::new(),
            message: format!("configuration must be an object, got {}", json_type(other)),
        }),
    }

    issues
}

fn validate_attributes(
    attributes: &IndexMap<String, Attribute>,
    map: &serde_json::Map<String, Value>,
    prefix: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for key in map.keys() {
        if !attributes.contains_key(key) {
            issues.push(ValidationIssue {
                path: join(prefix, key),
                message: "unsupported attribute".to_string(),
            });
        }
    }

    for (name, attribute) in attributes {
        let path = join(prefix, name);
        match map.get(name) {
            None | Some(Value::Null) => {
                if attribute.mode == AttributeMode::Required {
                    issues.push(ValidationIssue {
                        path,
                        message: "attribute is required".to_string(),
                    });
                }
            }
            Some(_) if attribute.mode == AttributeMode::Computed => {
                issues.push(ValidationIssue {
                    path,
                    message: "attribute is computed and cannot be configured".to_string(),
                });
            }
            Some(value) => validate_value(attribute, &attribute.type_, value, &path, issues),
        }
    }
}

fn validate_value(
    attribute: &Attribute,
    type_: &AttributeType,
    value: &Value,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let type_ok = match (type_, value) {
        (AttributeType::Dynamic, _) => true,
        (AttributeType::String, Value::String(_)) => true,
        (AttributeType::Bool, Value::Bool(_)) => true,
        (AttributeType::Int64, Value::Number(n)) => n.is_i64(),
        (AttributeType::Number, Value::Number(_)) => true,
        (AttributeType::List(element), Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, index);
                validate_element(element, item, &item_path, issues);
            }
            true
        }
        (AttributeType::Map(element), Value::Object(entries)) => {
            for (key, item) in entries {
                let item_path = format!("{}[\"{}\"]", path, key);
                validate_element(element, item, &item_path, issues);
            }
            true
        }
        (AttributeType::Object(nested), Value::Object(map)) => {
            validate_attributes(nested, map, path, issues);
            true
        }
        _ => false,
    };

    if !type_ok {
        issues.push(ValidationIssue {
            path: path.to_string(),
            message: format!("expected {}, got {}", type_.describe(), json_type(value)),
        });
        return;
    }

    for validator in &attribute.validators {
        if let Err(message) = validator.check(value) {
            issues.push(ValidationIssue {
                path: path.to_string(),
                message,
            });
        }
    }
}

/// Validate a list or map element, which carries no validators of its own
fn validate_element(
    type_: &AttributeType,
    value: &Value,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    if value.is_null() {
        return;
    }
    let element = Attribute::new(type_.clone(), AttributeMode::Optional);
    validate_value(&element, type_, value, path, issues);
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{CrdVersion, SchemaProperty};
    use crate::schema::SchemaBuilder;
    use crate::target::{CrdType, TypeKind};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn schema(kind: TypeKind) -> Schema {
        let mut hosts = BTreeMap::new();
        hosts.insert("port".to_string(), SchemaProperty::integer());

        let mut spec = BTreeMap::new();
        spec.insert("size".to_string(), SchemaProperty::integer());
        spec.insert("enabled".to_string(), SchemaProperty::boolean());
        spec.insert(
            "hosts".to_string(),
            SchemaProperty::array(SchemaProperty::object(hosts)),
        );
        spec.insert(
            "selector".to_string(),
            SchemaProperty::map(SchemaProperty::string()),
        );

        let mut root = BTreeMap::new();
        root.insert("spec".to_string(), SchemaProperty::object(spec).with_required(&["size"]));

        let version = CrdVersion {
            name: "v1".to_string(),
            served: true,
            storage: true,
            deprecated: false,
            deprecation_warning: None,
            schema: Some(SchemaProperty::object(root)),
        };
        let crd_type = CrdType::new("example.com", "v1", "Widget", "widgets");
        SchemaBuilder::new(&crd_type, Some(&version)).build(kind)
    }

    #[test]
    fn test_valid_config() {
        let config = json!({
            "metadata": {"name": "w", "namespace": "ns", "labels": {"app": "w"}},
            "spec": {"size": 3, "hosts": [{"port": 80}], "selector": {"tier": "web"}},
            "force_conflicts": true
        });
        assert!(validate_config(&schema(TypeKind::Resource), &config).is_empty());
    }

    #[test]
    fn test_empty_name_and_namespace_rejected() {
        let config = json!({"metadata": {"name": "", "namespace": ""}});
        let issues = validate_config(&schema(TypeKind::Manifest), &config);

        let paths: Vec<_> = issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"metadata.name"));
        assert!(paths.contains(&"metadata.namespace"));
        assert!(issues.iter().all(|i| i.message.contains("at least 1")));
    }

    #[test]
    fn test_missing_required() {
        let issues = validate_config(&schema(TypeKind::Resource), &json!({"spec": {}}));
        assert!(issues.contains(&ValidationIssue {
            path: "metadata".to_string(),
            message: "attribute is required".to_string(),
        }));
        assert!(issues.contains(&ValidationIssue {
            path: "spec.size".to_string(),
            message: "attribute is required".to_string(),
        }));
    }

    #[test]
    fn test_type_mismatches() {
        let config = json!({
            "metadata": {"name": "w", "namespace": "ns"},
            "spec": {"size": "three", "enabled": "yes", "hosts": [{"port": 1.5}], "selector": {"a": 1}}
        });
        let issues = validate_config(&schema(TypeKind::Resource), &config);

        let rendered: Vec<_> = issues.iter().map(ToString::to_string).collect();
        assert!(rendered.contains(&"spec.size: expected int64, got string".to_string()));
        assert!(rendered.contains(&"spec.enabled: expected bool, got string".to_string()));
        assert!(rendered.contains(&"spec.hosts[0].port: expected int64, got number".to_string()));
        assert!(rendered.contains(&"spec.selector[\"a\"]: expected string, got number".to_string()));
    }

    #[test]
    fn test_int64_range() {
        let config = |size: Value| {
            json!({"metadata": {"name": "w", "namespace": "ns"}, "spec": {"size": size}})
        };
        let schema = schema(TypeKind::Resource);

        assert!(validate_config(&schema, &config(json!(i64::MAX))).is_empty());
        assert!(validate_config(&schema, &config(json!(i64::MIN))).is_empty());

        let issues = validate_config(&schema, &config(json!(u64::MAX)));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "spec.size");
    }

    #[test]
    fn test_unknown_and_computed_attributes() {
        let config = json!({
            "id": "ns/w",
            "metadata": {"name": "w", "namespace": "ns", "uid": "x"},
            "spec": {"size": 1},
            "bogus": true
        });
        let issues = validate_config(&schema(TypeKind::Resource), &config);
        let paths: Vec<_> = issues.iter().map(|i| i.path.as_str()).collect();

        assert!(paths.contains(&"id"));
        assert!(paths.contains(&"metadata.uid"));
        assert!(paths.contains(&"bogus"));
    }

    #[test]
    fn test_non_object_config() {
        let issues = validate_config(&schema(TypeKind::Resource), &json!([1]));
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("must be an object"));
    }

    #[test]
    fn test_deletion_propagation_one_of() {
        let config = json!({
            "metadata": {"name": "w", "namespace": "ns"},
            "spec": {"size": 1},
            "deletion_propagation": "Eventually"
        });
        let issues = validate_config(&schema(TypeKind::Resource), &config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "deletion_propagation");
    }
}
