//! Typed objects exchanged with the API server
//!
//! [`Object<S>`] is the one shape every custom resource takes here:
//! type meta, a small metadata block and a spec. Schema-driven types use
//! `Object<serde_json::Value>`; hand-written models implement [`CrdModel`]
//! and use their own spec struct.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::target::CrdType;

/// Top-level keys the server owns; they never travel back into state
const SERVER_OWNED_KEYS: &[&str] = &["status"];

/// Object metadata carried by every type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn namespaced(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }
}

/// A custom resource object
///
/// `extra` holds top-level fields other than `spec` that some CRDs declare
/// (`data`, `rules`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object<S> {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<S>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<S> Object<S> {
    /// Create an empty object of the given type
    pub fn new(crd_type: &CrdType, metadata: ObjectMeta) -> Self {
        Self {
            api_version: crd_type.api_version(),
            kind: crd_type.kind.clone(),
            metadata,
            spec: None,
            extra: Map::new(),
        }
    }

    /// Builder: set the spec
    pub fn with_spec(mut self, spec: S) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Overwrite apiVersion and kind with the coordinates of `crd_type`
    pub fn stamp(&mut self, crd_type: &CrdType) {
        self.api_version = crd_type.api_version();
        self.kind = crd_type.kind.clone();
    }

    /// Id of this object under the ordering of `crd_type`
    pub fn id(&self, crd_type: &CrdType) -> String {
        crd_type.object_id(self.metadata.namespace.as_deref(), &self.metadata.name)
    }

    /// Drop server-owned top-level fields (`status`)
    pub fn strip_server_fields(&mut self) {
        for key in SERVER_OWNED_KEYS {
            self.extra.remove(*key);
        }
    }
}

impl<S: Serialize> Object<S> {
    /// Marshal into an unstructured JSON document
    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(CoreError::marshal)
    }
}

impl<S: DeserializeOwned> Object<S> {
    /// Unmarshal from an unstructured JSON document
    ///
    /// Unknown metadata fields (uid, resourceVersion, managedFields, ...) are
    /// discarded; `status` is dropped.
    pub fn from_json(value: Value) -> Result<Self> {
        let mut object: Self = serde_json::from_value(value).map_err(CoreError::unmarshal)?;
        object.strip_server_fields();
        Ok(object)
    }
}

/// A hand-written typed model of one CRD version
///
/// ```ignore
/// struct Certificate;
///
/// impl CrdModel for Certificate {
///     type Spec = CertificateSpec;
///
///     fn crd_type() -> CrdType {
///         CrdType::new("cert-manager.io", "v1", "Certificate", "certificates")
///     }
/// }
/// ```
pub trait CrdModel {
    type Spec: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync;

    fn crd_type() -> CrdType;

    /// Build an object of this model with apiVersion/kind filled in
    fn object(metadata: ObjectMeta, spec: Self::Spec) -> Object<Self::Spec> {
        Object::new(&Self::crd_type(), metadata).with_spec(spec)
    }
}
