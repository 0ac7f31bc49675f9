//! CRD YAML parser
//!
//! Parses CustomResourceDefinition manifests into [`CrdDefinition`]s.

use serde::Deserialize;
use serde_json::Value;

use super::openapi::{
    AdditionalProperties, CrdDefinition, CrdNames, CrdVersion, PropertyType, SchemaProperty,
};
use crate::error::{CoreError, Result};
use crate::target::CrdScope;

const CRD_KIND: &str = "CustomResourceDefinition";

/// Parser for CRD YAML manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse a single CRD YAML document
    pub fn parse(yaml: &str) -> Result<CrdDefinition> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| CoreError::invalid_crd(format!("Invalid CRD YAML: {}", e)))?;

        Self::parse_value(&value)
    }

    /// Parse every CRD in a multi-document YAML stream
    ///
    /// Documents of other kinds and empty documents are skipped, so a whole
    /// operator bundle can be fed in as-is.
    pub fn parse_all(yaml: &str) -> Result<Vec<CrdDefinition>> {
        let mut crds = Vec::new();

        for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
            let value = Value::deserialize(document).map_err(|e| {
                CoreError::invalid_crd(format!("Invalid YAML in document {}: {}", index, e))
            })?;

            if value.is_null() {
                continue;
            }

            if value.get("kind").and_then(Value::as_str) != Some(CRD_KIND) {
                tracing::debug!(document = index, "skipping non-CRD document");
                continue;
            }

            crds.push(Self::parse_value(&value)?);
        }

        Ok(crds)
    }

    /// Parse from a serde_json::Value
    pub fn parse_value(value: &Value) -> Result<CrdDefinition> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("Missing 'kind' field"))?;

        if kind != CRD_KIND {
            return Err(CoreError::invalid_crd(format!(
                "Expected {}, got {}",
                CRD_KIND, kind
            )));
        }

        let name = value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("Missing 'metadata.name' field"))?
            .to_string();

        let spec = value
            .get("spec")
            .ok_or_else(|| CoreError::invalid_crd("Missing 'spec' field"))?;

        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("Missing 'spec.group' field"))?
            .to_string();

        let scope = spec
            .get("scope")
            .and_then(Value::as_str)
            .map(|s| match s {
                "Cluster" => CrdScope::Cluster,
                _ => CrdScope::Namespaced,
            })
            .unwrap_or(CrdScope::Namespaced);

        let names = Self::parse_names(spec.get("names"))?;
        let versions = Self::parse_versions(spec.get("versions"))?;

        Ok(CrdDefinition {
            name,
            group,
            scope,
            names,
            versions,
        })
    }

    fn parse_names(names_value: Option<&Value>) -> Result<CrdNames> {
        let names =
            names_value.ok_or_else(|| CoreError::invalid_crd("Missing 'spec.names' field"))?;

        let kind = names
            .get("kind")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::invalid_crd("Missing 'spec.names.kind' field"))?;

        let plural = names
            .get("plural")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::invalid_crd("Missing 'spec.names.plural' field"))?;

        Ok(CrdNames {
            kind: kind.to_string(),
            plural: plural.to_string(),
        })
    }

    fn parse_versions(versions_value: Option<&Value>) -> Result<Vec<CrdVersion>> {
        let versions = versions_value
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::invalid_crd("Missing 'spec.versions' array"))?;

        versions.iter().map(Self::parse_version).collect()
    }

    fn parse_version(version: &Value) -> Result<CrdVersion> {
        let name = version
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("Version missing 'name' field"))?
            .to_string();

        let schema = version
            .get("schema")
            .and_then(|s| s.get("openAPIV3Schema"))
            .map(Self::parse_schema_property);

        Ok(CrdVersion {
            name,
            served: version
                .get("served")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            storage: version
                .get("storage")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            deprecated: version
                .get("deprecated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            deprecation_warning: version
                .get("deprecationWarning")
                .and_then(Value::as_str)
                .map(String::from),
            schema,
        })
    }

    /// Parse a single schema property (recursive)
    fn parse_schema_property(prop: &Value) -> SchemaProperty {
        let flag = |key: &str| prop.get(key).and_then(Value::as_bool).unwrap_or(false);
        let text = |key: &str| prop.get(key).and_then(Value::as_str).map(String::from);

        let properties = prop
            .get("properties")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::parse_schema_property(v)))
                    .collect()
            });

        let additional_properties = prop.get("additionalProperties").map(|v| match v {
            Value::Bool(true) => AdditionalProperties::Allowed,
            Value::Bool(false) => AdditionalProperties::Denied,
            other => AdditionalProperties::Schema(Box::new(Self::parse_schema_property(other))),
        });

        SchemaProperty {
            type_: prop
                .get("type")
                .and_then(Value::as_str)
                .map(PropertyType::parse)
                .unwrap_or_else(|| PropertyType::Unknown(String::new())),
            description: text("description"),
            pattern: text("pattern"),
            enum_values: prop.get("enum").and_then(Value::as_array).cloned(),
            minimum: prop.get("minimum").and_then(Value::as_f64),
            maximum: prop.get("maximum").and_then(Value::as_f64),
            min_length: prop.get("minLength").and_then(Value::as_u64),
            max_length: prop.get("maxLength").and_then(Value::as_u64),
            min_items: prop.get("minItems").and_then(Value::as_u64),
            max_items: prop.get("maxItems").and_then(Value::as_u64),
            properties,
            required: prop.get("required").map(|r| string_array(Some(r))),
            items: prop
                .get("items")
                .map(|v| Box::new(Self::parse_schema_property(v))),
            additional_properties,
            x_preserve_unknown: flag("x-kubernetes-preserve-unknown-fields"),
            x_embedded_resource: flag("x-kubernetes-embedded-resource"),
            x_int_or_string: flag("x-kubernetes-int-or-string"),
        }
    }
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERTIFICATE_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: certificates.cert-manager.io
spec:
  group: cert-manager.io
  scope: Namespaced
  names:
    kind: Certificate
    plural: certificates
    singular: certificate
    shortNames: [cert, certs]
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            apiVersion:
              type: string
            kind:
              type: string
            metadata:
              type: object
            spec:
              type: object
              required: [secretName]
              properties:
                secretName:
                  type: string
                  description: Name of the Secret resource
                dnsNames:
                  type: array
                  items:
                    type: string
                duration:
                  type: string
                  pattern: '^[0-9]+h$'
                privateKey:
                  type: object
                  properties:
                    algorithm:
                      type: string
                      enum: [RSA, ECDSA, Ed25519]
                    size:
                      type: integer
                      minimum: 256
                      maximum: 8192
                secretTemplate:
                  type: object
                  properties:
                    labels:
                      type: object
                      additionalProperties:
                        type: string
                port:
                  x-kubernetes-int-or-string: true
            status:
              type: object
              x-kubernetes-preserve-unknown-fields: true
    - name: v1alpha2
      served: false
      storage: false
"#;

    fn nested<'a>(prop: &'a SchemaProperty, path: &str) -> &'a SchemaProperty {
        path.split('.').fold(prop, |current, part| {
            &current.properties.as_ref().unwrap()[part]
        })
    }

    #[test]
    fn test_parse_basic_crd() {
        let crd = CrdParser::parse(CERTIFICATE_CRD).unwrap();

        assert_eq!(crd.name, "certificates.cert-manager.io");
        assert_eq!(crd.group, "cert-manager.io");
        assert_eq!(crd.scope, CrdScope::Namespaced);
        assert_eq!(crd.names.kind, "Certificate");
        assert_eq!(crd.names.plural, "certificates");
        assert_eq!(crd.versions.len(), 2);
        assert_eq!(crd.served_versions().count(), 1);
    }

    #[test]
    fn test_parse_nested_schema() {
        let crd = CrdParser::parse(CERTIFICATE_CRD).unwrap();
        let schema = crd.versions[0].schema.as_ref().unwrap();
        let spec = nested(schema, "spec");

        assert!(spec.is_required("secretName"));
        assert_eq!(
            nested(spec, "secretName").description.as_deref(),
            Some("Name of the Secret resource")
        );
        assert_eq!(
            nested(spec, "dnsNames").items.as_ref().unwrap().type_,
            PropertyType::String
        );

        let algorithm = nested(spec, "privateKey.algorithm");
        assert_eq!(algorithm.enum_values.as_ref().unwrap().len(), 3);

        let size = nested(spec, "privateKey.size");
        assert_eq!(size.minimum, Some(256.0));
        assert_eq!(size.maximum, Some(8192.0));

        let labels = nested(spec, "secretTemplate.labels");
        assert!(matches!(
            labels.additional_properties,
            Some(AdditionalProperties::Schema(_))
        ));

        assert!(nested(spec, "port").x_int_or_string);
        assert!(nested(schema, "status").x_preserve_unknown);
    }

    #[test]
    fn test_parse_all_skips_other_kinds() {
        let bundle = format!(
            "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: cert-manager\n---\n{}\n---\n",
            CERTIFICATE_CRD
        );

        let crds = CrdParser::parse_all(&bundle).unwrap();
        assert_eq!(crds.len(), 1);
        assert_eq!(crds[0].names.kind, "Certificate");
    }

    #[test]
    fn test_parse_rejects_non_crd() {
        let err = CrdParser::parse("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\n")
            .unwrap_err();
        assert!(err.to_string().contains("Expected CustomResourceDefinition"));
    }

    #[test]
    fn test_parse_requires_plural() {
        let yaml = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
  versions: []
"#;
        let err = CrdParser::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("spec.names.plural"));
    }

    #[test]
    fn test_parse_cluster_scope() {
        let yaml = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: clusterissuers.cert-manager.io
spec:
  group: cert-manager.io
  scope: Cluster
  names:
    kind: ClusterIssuer
    plural: clusterissuers
  versions:
    - name: v1
      served: true
      storage: true
"#;
        let crd = CrdParser::parse(yaml).unwrap();
        assert_eq!(crd.scope, CrdScope::Cluster);
        assert!(crd.versions[0].schema.is_none());
    }
}
