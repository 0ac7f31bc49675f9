//! The generic CRD adapter
//!
//! One [`CrdAdapter`] serves any custom resource: it is parameterised by the
//! [`CrdType`] coordinates and the spec type, and forwards to a shared
//! [`ClusterApi`] handle. Every cluster-touching verb goes through
//! [`Connection::cluster`], so an offline connection fails before any
//! request is built.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crdform_core::{CoreError, CrdModel, CrdType, Object};

use crate::cluster::{ApplyParams, ClusterApi, Propagation};
use crate::error::{KubeError, Result};

/// How the provider reaches the cluster
#[derive(Clone)]
pub enum Connection {
    /// No cluster access; only manifests can be rendered
    Offline,
    /// A shared cluster handle
    Online(Arc<dyn ClusterApi>),
}

impl Connection {
    pub fn online(cluster: impl ClusterApi + 'static) -> Self {
        Self::Online(Arc::new(cluster))
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }

    /// The cluster handle, or an offline error naming `operation`
    pub fn cluster(&self, operation: &str) -> Result<&Arc<dyn ClusterApi>> {
        match self {
            Self::Online(cluster) => Ok(cluster),
            Self::Offline => {
                tracing::debug!(operation, "refusing cluster call in offline mode");
                Err(KubeError::Offline {
                    operation: operation.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => f.write_str("Offline"),
            Self::Online(_) => f.write_str("Online"),
        }
    }
}

/// Adapter between typed objects and the Kubernetes API for one CRD type
pub struct CrdAdapter<S> {
    crd_type: CrdType,
    connection: Connection,
    _spec: PhantomData<fn() -> S>,
}

impl<S> Clone for CrdAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            crd_type: self.crd_type.clone(),
            connection: self.connection.clone(),
            _spec: PhantomData,
        }
    }
}

impl<S> CrdAdapter<S>
where
    S: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    pub fn new(crd_type: CrdType, connection: Connection) -> Self {
        Self {
            crd_type,
            connection,
            _spec: PhantomData,
        }
    }

    /// Adapter for a hand-written model
    pub fn for_model<K>(connection: Connection) -> Self
    where
        K: CrdModel<Spec = S>,
    {
        Self::new(K::crd_type(), connection)
    }

    pub fn crd_type(&self) -> &CrdType {
        &self.crd_type
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// GET one object and unmarshal it into the spec type
    ///
    /// The returned object carries this type's apiVersion/kind and has
    /// `status` removed.
    pub async fn read(&self, namespace: Option<&str>, name: &str) -> Result<Object<S>> {
        let cluster = self.connection.cluster("read")?;
        check_name(name)?;
        self.check_namespace(namespace)?;

        let namespace = self.effective_namespace(namespace);
        let value = cluster.get(&self.crd_type, namespace, name).await?;

        let mut object = Object::<S>::from_json(value)?;
        object.stamp(&self.crd_type);
        Ok(object)
    }

    /// Server-side apply `object` and return what the server stored
    pub async fn apply(&self, object: &Object<S>, params: &ApplyParams) -> Result<Object<S>> {
        let cluster = self.connection.cluster("apply")?;
        check_name(&object.metadata.name)?;
        self.check_namespace(object.metadata.namespace.as_deref())?;

        let mut outgoing = object.clone();
        outgoing.stamp(&self.crd_type);
        if !self.crd_type.scope.is_namespaced() {
            outgoing.metadata.namespace = None;
        }
        let body = outgoing.to_json()?;

        let namespace = self.effective_namespace(outgoing.metadata.namespace.as_deref());
        let applied = cluster
            .apply(&self.crd_type, namespace, &outgoing.metadata.name, &body, params)
            .await?;

        let mut object = Object::<S>::from_json(applied)?;
        object.stamp(&self.crd_type);
        tracing::info!(
            crd_type = %self.crd_type,
            id = %object.id(&self.crd_type),
            "applied"
        );
        Ok(object)
    }

    /// DELETE one object
    pub async fn delete(
        &self,
        namespace: Option<&str>,
        name: &str,
        propagation: Option<Propagation>,
    ) -> Result<()> {
        let cluster = self.connection.cluster("delete")?;
        check_name(name)?;
        self.check_namespace(namespace)?;

        let namespace = self.effective_namespace(namespace);
        cluster
            .delete(&self.crd_type, namespace, name, propagation)
            .await?;
        tracing::info!(
            crd_type = %self.crd_type,
            id = %self.crd_type.object_id(namespace, name),
            "deleted"
        );
        Ok(())
    }

    /// Render `object` as YAML without touching the cluster
    pub fn render_manifest(&self, object: &Object<S>) -> Result<String> {
        Ok(crdform_core::render_manifest(&self.crd_type, object)?)
    }

    /// Namespaced types need a non-empty namespace; the client never falls
    /// back to the kubeconfig default
    fn check_namespace(&self, namespace: Option<&str>) -> Result<()> {
        if self.crd_type.scope.is_namespaced() && namespace.is_none_or(str::is_empty) {
            return Err(CoreError::MissingField {
                field: "metadata.namespace".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn effective_namespace<'a>(&self, namespace: Option<&'a str>) -> Option<&'a str> {
        namespace.filter(|_| self.crd_type.scope.is_namespaced())
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CoreError::MissingField {
            field: "metadata.name".to_string(),
        }
        .into());
    }
    Ok(())
}
