//! State ⇄ object conversion
//!
//! State documents use the schema's snake_case attribute names; objects use
//! the JSON names the API server expects. The schema carries both, so
//! conversion walks the attribute tree alongside the value.

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::object::{Object, ObjectMeta};
use crate::schema::{AttributeType, Schema};
use crate::target::CrdType;

/// Attributes that only exist on the provider side and survive a read
/// unchanged from the prior state
const CARRIED_SETTINGS: &[&str] = &["force_conflicts", "field_manager", "deletion_propagation"];

/// Build an object from a state or configuration document
///
/// Null and unset attributes are omitted; apiVersion and kind come from
/// `crd_type`.
pub fn state_to_object(schema: &Schema, crd_type: &CrdType, state: &Value) -> Result<Object<Value>> {
    let root = state.as_object().ok_or_else(|| CoreError::InvalidAttribute {
        path: String::new(),
        message: "state must be an object".to_string(),
    })?;

    let mut object: Object<Value> = Object::new(crd_type, ObjectMeta::default());

    for (name, attribute) in &schema.attributes {
        let Some(json_name) = attribute.json_name.as_deref() else {
            continue;
        };
        let Some(value) = root.get(name).and_then(|v| to_json_value(&attribute.type_, v)) else {
            continue;
        };

        match json_name {
            "apiVersion" | "kind" => {}
            "metadata" => {
                object.metadata = serde_json::from_value(value).map_err(CoreError::unmarshal)?;
            }
            "spec" => object.spec = Some(value),
            other => {
                object.extra.insert(other.to_string(), value);
            }
        }
    }

    Ok(object)
}

/// Build a state document from an object
///
/// Only attributes known to the schema are copied. `id` is derived from the
/// object's metadata; provider-side settings are kept from `prior`.
pub fn object_to_state(
    schema: &Schema,
    crd_type: &CrdType,
    object: &Object<Value>,
    prior: Option<&Value>,
) -> Result<Value> {
    let json = object.to_json()?;
    let mut state = Map::new();

    for (name, attribute) in &schema.attributes {
        let value = match attribute.json_name.as_deref() {
            Some(json_name) => json
                .get(json_name)
                .and_then(|v| from_json_value(&attribute.type_, v)),
            None if name == "id" => Some(Value::String(object.id(crd_type))),
            None if CARRIED_SETTINGS.contains(&name.as_str()) => prior
                .and_then(|p| p.get(name))
                .filter(|v| !v.is_null())
                .cloned(),
            None => None,
        };

        if let Some(value) = value {
            state.insert(name.clone(), value);
        }
    }

    Ok(Value::Object(state))
}

/// Convert a snake_case value tree into JSON names
fn to_json_value(type_: &AttributeType, value: &Value) -> Option<Value> {
    match (type_, value) {
        (_, Value::Null) => None,
        (AttributeType::Object(nested), Value::Object(map)) => {
            let mut out = Map::new();
            for (name, attribute) in nested {
                let (Some(json_name), Some(v)) = (attribute.json_name.as_deref(), map.get(name))
                else {
                    continue;
                };
                if let Some(v) = to_json_value(&attribute.type_, v) {
                    out.insert(json_name.to_string(), v);
                }
            }
            Some(Value::Object(out))
        }
        (AttributeType::List(element), Value::Array(items)) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| to_json_value(element, item))
                .collect(),
        )),
        (AttributeType::Map(element), Value::Object(entries)) => Some(Value::Object(
            entries
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), to_json_value(element, v)?)))
                .collect(),
        )),
        (_, other) => Some(other.clone()),
    }
}

/// Convert a JSON value tree into snake_case attribute names
fn from_json_value(type_: &AttributeType, value: &Value) -> Option<Value> {
    match (type_, value) {
        (_, Value::Null) => None,
        (AttributeType::Object(nested), Value::Object(map)) => {
            let mut out = Map::new();
            for (name, attribute) in nested {
                let Some(v) = attribute.json_name.as_deref().and_then(|j| map.get(j)) else {
                    continue;
                };
                if let Some(v) = from_json_value(&attribute.type_, v) {
                    out.insert(name.clone(), v);
                }
            }
            Some(Value::Object(out))
        }
        (AttributeType::List(element), Value::Array(items)) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| from_json_value(element, item))
                .collect(),
        )),
        (AttributeType::Map(element), Value::Object(entries)) => Some(Value::Object(
            entries
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), from_json_value(element, v)?)))
                .collect(),
        )),
        (_, other) => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{CrdVersion, SchemaProperty};
    use crate::schema::SchemaBuilder;
    use crate::target::TypeKind;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn widget_schema(kind: TypeKind) -> (CrdType, Schema) {
        let mut tls = BTreeMap::new();
        tls.insert("secretName".to_string(), SchemaProperty::string());

        let mut spec = BTreeMap::new();
        spec.insert("podCIDR".to_string(), SchemaProperty::string());
        spec.insert("replicaCount".to_string(), SchemaProperty::integer());
        spec.insert("tlsConfigs".to_string(), SchemaProperty::array(SchemaProperty::object(tls)));
        spec.insert("nodeSelector".to_string(), SchemaProperty::map(SchemaProperty::string()));
        spec.insert(
            "rawConfig".to_string(),
            SchemaProperty {
                x_preserve_unknown: true,
                ..Default::default()
            },
        );

        let mut root = BTreeMap::new();
        root.insert("spec".to_string(), SchemaProperty::object(spec));
        root.insert("data".to_string(), SchemaProperty::map(SchemaProperty::string()));

        let version = CrdVersion {
            name: "v1".to_string(),
            served: true,
            storage: true,
            deprecated: false,
            deprecation_warning: None,
            schema: Some(SchemaProperty::object(root)),
        };
        let crd_type = CrdType::new("example.com", "v1", "Widget", "widgets");
        let schema = SchemaBuilder::new(&crd_type, Some(&version)).build(kind);
        (crd_type, schema)
    }

    #[test]
    fn test_state_to_object_maps_names() {
        let (crd_type, schema) = widget_schema(TypeKind::Resource);
        let state = json!({
            "metadata": {"name": "w", "namespace": "ns", "labels": {"app.kubernetes.io/name": "w"}},
            "spec": {
                "pod_cidr": "10.0.0.0/16",
                "replica_count": null,
                "tls_configs": [{"secret_name": "tls"}],
                "node_selector": {"disk_type": "ssd"},
                "raw_config": {"keepThis": {"as_is": 1}}
            },
            "data": {"key": "value"},
            "force_conflicts": true
        });

        let object = state_to_object(&schema, &crd_type, &state).unwrap();
        assert_eq!(object.api_version, "example.com/v1");
        assert_eq!(object.metadata.namespace.as_deref(), Some("ns"));
        assert_eq!(
            object.metadata.labels.get("app.kubernetes.io/name").map(String::as_str),
            Some("w")
        );
        assert_eq!(
            object.spec,
            Some(json!({
                "podCIDR": "10.0.0.0/16",
                "tlsConfigs": [{"secretName": "tls"}],
                "nodeSelector": {"disk_type": "ssd"},
                "rawConfig": {"keepThis": {"as_is": 1}}
            }))
        );
        assert_eq!(object.extra.get("data"), Some(&json!({"key": "value"})));
        assert!(!object.extra.contains_key("force_conflicts"));
    }

    #[test]
    fn test_object_to_state_stamps_id_and_keeps_settings() {
        let (crd_type, schema) = widget_schema(TypeKind::Resource);
        let object = Object::from_json(json!({
            "apiVersion": "example.com/v1",
            "kind": "Widget",
            "metadata": {"name": "w", "namespace": "ns", "uid": "abc"},
            "spec": {"podCIDR": "10.0.0.0/16", "unknownField": 1},
            "status": {"phase": "Ready"}
        }))
        .unwrap();
        let prior = json!({"force_conflicts": true, "field_manager": null});

        let state = object_to_state(&schema, &crd_type, &object, Some(&prior)).unwrap();
        assert_eq!(
            state,
            json!({
                "id": "ns/w",
                "api_version": "example.com/v1",
                "kind": "Widget",
                "metadata": {"name": "w", "namespace": "ns"},
                "spec": {"pod_cidr": "10.0.0.0/16"},
                "force_conflicts": true
            })
        );
    }

    #[test]
    fn test_round_trip_through_object() {
        let (crd_type, schema) = widget_schema(TypeKind::Resource);
        let state = json!({
            "id": "ns/w",
            "api_version": "example.com/v1",
            "kind": "Widget",
            "metadata": {"name": "w", "namespace": "ns", "annotations": {"note": "x"}},
            "spec": {"replica_count": 2, "tls_configs": [{"secret_name": "tls"}]}
        });

        let object = state_to_object(&schema, &crd_type, &state).unwrap();
        let back = object_to_state(&schema, &crd_type, &object, None).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_state_must_be_object() {
        let (crd_type, schema) = widget_schema(TypeKind::Manifest);
        assert!(state_to_object(&schema, &crd_type, &json!("nope")).is_err());
    }
}
