//! Mock cluster for testing
//!
//! Stores objects in memory, useful for unit tests without requiring a
//! Kubernetes cluster. Server-side apply is approximated: the last field
//! manager owns the whole object and a different manager conflicts unless
//! it forces.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crdform_core::CrdType;

use crate::cluster::{ApplyParams, ClusterApi, Propagation};
use crate::error::{KubeError, Result};

/// (apiVersion, kind, namespace, name)
type ObjectKey = (String, String, String, String);

#[derive(Debug, Clone)]
struct StoredObject {
    body: Value,
    manager: String,
}

/// A request seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Get {
        namespace: Option<String>,
        name: String,
    },
    Apply {
        namespace: Option<String>,
        name: String,
        body: Value,
        params: ApplyParams,
    },
    Delete {
        namespace: Option<String>,
        name: String,
        propagation: Option<Propagation>,
    },
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub applies: usize,
    pub deletes: usize,
}

impl OperationCounts {
    pub fn total(&self) -> usize {
        self.gets + self.applies + self.deletes
    }
}

/// In-memory cluster for testing
#[derive(Clone, Default)]
pub struct MockCluster {
    store: Arc<RwLock<BTreeMap<ObjectKey, StoredObject>>>,
    operations: Arc<RwLock<OperationCounts>>,
    requests: Arc<RwLock<Vec<Request>>>,
    failure: Arc<RwLock<Option<(u16, String)>>>,
    resource_version: Arc<RwLock<u64>>,
}

impl MockCluster {
    /// Create a new empty mock cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate one object as if `manager` had applied it
    pub fn insert(&self, crd_type: &CrdType, body: Value, manager: &str) {
        let namespace = body["metadata"]["namespace"].as_str().map(String::from);
        let name = body["metadata"]["name"].as_str().unwrap_or_default().to_string();
        let key = key_for(crd_type, namespace.as_deref(), &name);
        let body = self.server_side_fields(crd_type, body, None);
        self.store.write().unwrap().insert(
            key,
            StoredObject {
                body,
                manager: manager.to_string(),
            },
        );
    }

    /// Make every following call fail with an API error of the given code
    pub fn fail_with(&self, code: u16, message: &str) {
        *self.failure.write().unwrap() = Some((code, message.to_string()));
    }

    /// Stop failing calls
    pub fn clear_failure(&self) {
        *self.failure.write().unwrap() = None;
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts and recorded requests
    pub fn reset_counts(&self) {
        *self.operations.write().unwrap() = OperationCounts::default();
        self.requests.write().unwrap().clear();
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<Request> {
        self.requests.read().unwrap().clone()
    }

    /// Stored object, as the server would return it
    pub fn stored(&self, crd_type: &CrdType, namespace: Option<&str>, name: &str) -> Option<Value> {
        let key = key_for(crd_type, namespace, name);
        self.store.read().unwrap().get(&key).map(|o| o.body.clone())
    }

    /// Count stored objects
    pub fn object_count(&self) -> usize {
        self.store.read().unwrap().len()
    }

    fn record(&self, request: Request) {
        {
            let mut ops = self.operations.write().unwrap();
            match request {
                Request::Get { .. } => ops.gets += 1,
                Request::Apply { .. } => ops.applies += 1,
                Request::Delete { .. } => ops.deletes += 1,
            }
        }
        self.requests.write().unwrap().push(request);
    }

    fn injected_failure(&self) -> Option<KubeError> {
        self.failure
            .read()
            .unwrap()
            .as_ref()
            .map(|(code, message)| api_error(*code, message))
    }

    /// Add the fields a real API server fills in
    fn server_side_fields(&self, crd_type: &CrdType, mut body: Value, uid: Option<Value>) -> Value {
        let resource_version = {
            let mut rv = self.resource_version.write().unwrap();
            *rv += 1;
            *rv
        };

        if let Some(metadata) = body.get_mut("metadata").and_then(Value::as_object_mut) {
            if !crd_type.scope.is_namespaced() {
                metadata.remove("namespace");
            }
            let uid = uid.unwrap_or_else(|| json!(format!("uid-{}", resource_version)));
            metadata.insert("uid".to_string(), uid);
            metadata.insert(
                "resourceVersion".to_string(),
                json!(resource_version.to_string()),
            );
        }
        if let Some(object) = body.as_object_mut() {
            object.insert("status".to_string(), json!({"observedGeneration": 1}));
        }
        body
    }
}

#[async_trait]
impl ClusterApi for MockCluster {
    async fn get(&self, crd_type: &CrdType, namespace: Option<&str>, name: &str) -> Result<Value> {
        self.record(Request::Get {
            namespace: namespace.map(String::from),
            name: name.to_string(),
        });
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }

        let key = key_for(crd_type, namespace, name);
        self.store
            .read()
            .unwrap()
            .get(&key)
            .map(|o| o.body.clone())
            .ok_or_else(|| not_found(crd_type, namespace, name))
    }

    async fn apply(
        &self,
        crd_type: &CrdType,
        namespace: Option<&str>,
        name: &str,
        object: &Value,
        params: &ApplyParams,
    ) -> Result<Value> {
        self.record(Request::Apply {
            namespace: namespace.map(String::from),
            name: name.to_string(),
            body: object.clone(),
            params: params.clone(),
        });
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }

        let key = key_for(crd_type, namespace, name);
        let existing = self.store.read().unwrap().get(&key).cloned();

        if let Some(existing) = &existing
            && existing.manager != params.field_manager
            && !params.force_conflicts
        {
            return Err(api_error(
                409,
                &format!(
                    "Apply failed with 1 conflict: conflict with \"{}\"",
                    existing.manager
                ),
            ));
        }

        let uid = existing.map(|o| o.body["metadata"]["uid"].clone());
        let body = self.server_side_fields(crd_type, object.clone(), uid);
        self.store.write().unwrap().insert(
            key,
            StoredObject {
                body: body.clone(),
                manager: params.field_manager.clone(),
            },
        );
        Ok(body)
    }

    async fn delete(
        &self,
        crd_type: &CrdType,
        namespace: Option<&str>,
        name: &str,
        propagation: Option<Propagation>,
    ) -> Result<()> {
        self.record(Request::Delete {
            namespace: namespace.map(String::from),
            name: name.to_string(),
            propagation,
        });
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }

        let key = key_for(crd_type, namespace, name);
        self.store
            .write()
            .unwrap()
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| not_found(crd_type, namespace, name))
    }
}

fn key_for(crd_type: &CrdType, namespace: Option<&str>, name: &str) -> ObjectKey {
    let namespace = if crd_type.scope.is_namespaced() {
        namespace.unwrap_or("default").to_string()
    } else {
        String::new()
    };
    (
        crd_type.api_version(),
        crd_type.kind.clone(),
        namespace,
        name.to_string(),
    )
}

fn not_found(crd_type: &CrdType, namespace: Option<&str>, name: &str) -> KubeError {
    KubeError::NotFound {
        kind: crd_type.kind.clone(),
        namespace: namespace
            .filter(|_| crd_type.scope.is_namespaced())
            .map(String::from),
        name: name.to_string(),
    }
}

fn api_error(code: u16, message: &str) -> KubeError {
    KubeError::Api(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: match code {
            404 => "NotFound",
            409 => "Conflict",
            422 => "Invalid",
            _ => "InternalError",
        }
        .to_string(),
        code,
    }))
}
