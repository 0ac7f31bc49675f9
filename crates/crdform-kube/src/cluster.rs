//! Cluster access behind a narrow trait
//!
//! [`ClusterApi`] is the one seam between the generic adapter and the API
//! server: three verbs on unstructured JSON documents. [`KubeCluster`]
//! implements it with `kube`'s dynamic `Api<DynamicObject>`; tests use
//! [`MockCluster`](crate::MockCluster).

use async_trait::async_trait;
use kube::{
    Client,
    api::{Api, ApiResource, DeleteParams, DynamicObject, Patch, PatchParams, PropagationPolicy},
    config::{KubeConfigOptions, Kubeconfig},
    core::params::ValidationDirective,
};
use serde_json::Value;

use crdform_core::CrdType;

use crate::config::ProviderConfig;
use crate::error::{KubeError, Result};

/// Server-side apply settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyParams {
    pub field_manager: String,
    pub force_conflicts: bool,
}

/// Deletion propagation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Orphan,
    Background,
    Foreground,
}

impl std::str::FromStr for Propagation {
    type Err = KubeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Orphan" => Ok(Self::Orphan),
            "Background" => Ok(Self::Background),
            "Foreground" => Ok(Self::Foreground),
            other => Err(KubeError::InvalidConfig(format!(
                "unknown deletion propagation '{}', expected Orphan, Background or Foreground",
                other
            ))),
        }
    }
}

impl From<Propagation> for PropagationPolicy {
    fn from(p: Propagation) -> Self {
        match p {
            Propagation::Orphan => PropagationPolicy::Orphan,
            Propagation::Background => PropagationPolicy::Background,
            Propagation::Foreground => PropagationPolicy::Foreground,
        }
    }
}

/// The three API verbs the adapter needs
///
/// `namespace` is ignored for cluster-scoped types.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// GET one object
    async fn get(&self, crd_type: &CrdType, namespace: Option<&str>, name: &str) -> Result<Value>;

    /// Server-side apply one object, returning what the server stored
    async fn apply(
        &self,
        crd_type: &CrdType,
        namespace: Option<&str>,
        name: &str,
        object: &Value,
        params: &ApplyParams,
    ) -> Result<Value>;

    /// DELETE one object
    async fn delete(
        &self,
        crd_type: &CrdType,
        namespace: Option<&str>,
        name: &str,
        propagation: Option<Propagation>,
    ) -> Result<()>;
}

/// [`ClusterApi`] backed by a real Kubernetes client
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Connect using the kubeconfig settings of `config`
    pub async fn connect(config: &ProviderConfig) -> Result<Self> {
        let options = KubeConfigOptions {
            context: config.context.clone(),
            ..Default::default()
        };

        let kube_config = match &config.kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .map_err(|e| KubeError::Kubeconfig(format!("{}: {}", path.display(), e)))?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| KubeError::Kubeconfig(e.to_string()))?
            }
            None if config.context.is_some() => kube::Config::from_kubeconfig(&options)
                .await
                .map_err(|e| KubeError::Kubeconfig(e.to_string()))?,
            None => kube::Config::infer()
                .await
                .map_err(|e| KubeError::Kubeconfig(e.to_string()))?,
        };

        tracing::debug!(cluster_url = %kube_config.cluster_url, "connecting to cluster");
        let client = Client::try_from(kube_config)?;
        Ok(Self { client })
    }

    /// Create with an existing Kubernetes client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Get the underlying Kubernetes client
    pub fn kube_client(&self) -> &Client {
        &self.client
    }

    fn api(&self, crd_type: &CrdType, namespace: Option<&str>) -> Api<DynamicObject> {
        let resource = api_resource(crd_type);
        match (crd_type.scope.is_namespaced(), namespace) {
            (true, Some(ns)) => Api::namespaced_with(self.client.clone(), ns, &resource),
            (true, None) => Api::default_namespaced_with(self.client.clone(), &resource),
            (false, _) => Api::all_with(self.client.clone(), &resource),
        }
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn get(&self, crd_type: &CrdType, namespace: Option<&str>, name: &str) -> Result<Value> {
        tracing::debug!(%crd_type, ?namespace, name, "GET");
        let object = self
            .api(crd_type, namespace)
            .get(name)
            .await
            .map_err(|e| not_found_or(e, crd_type, namespace, name))?;
        serde_json::to_value(&object).map_err(|e| KubeError::Unmarshal(e.to_string()))
    }

    async fn apply(
        &self,
        crd_type: &CrdType,
        namespace: Option<&str>,
        name: &str,
        object: &Value,
        params: &ApplyParams,
    ) -> Result<Value> {
        tracing::debug!(
            %crd_type,
            ?namespace,
            name,
            field_manager = %params.field_manager,
            force = params.force_conflicts,
            "PATCH (server-side apply)"
        );

        let dynamic: DynamicObject = serde_json::from_value(object.clone())
            .map_err(|e| KubeError::Marshal(e.to_string()))?;

        let mut patch_params = PatchParams::apply(&params.field_manager);
        patch_params.force = params.force_conflicts;
        patch_params.field_validation = Some(ValidationDirective::Strict);

        let applied = self
            .api(crd_type, namespace)
            .patch(name, &patch_params, &Patch::Apply(&dynamic))
            .await?;
        serde_json::to_value(&applied).map_err(|e| KubeError::Unmarshal(e.to_string()))
    }

    async fn delete(
        &self,
        crd_type: &CrdType,
        namespace: Option<&str>,
        name: &str,
        propagation: Option<Propagation>,
    ) -> Result<()> {
        tracing::debug!(%crd_type, ?namespace, name, ?propagation, "DELETE");
        let params = DeleteParams {
            propagation_policy: propagation.map(Into::into),
            ..Default::default()
        };

        self.api(crd_type, namespace)
            .delete(name, &params)
            .await
            .map_err(|e| not_found_or(e, crd_type, namespace, name))?;
        Ok(())
    }
}

/// Dynamic API resource for a CRD type
pub fn api_resource(crd_type: &CrdType) -> ApiResource {
    ApiResource {
        group: crd_type.group.clone(),
        version: crd_type.version.clone(),
        api_version: crd_type.api_version(),
        kind: crd_type.kind.clone(),
        plural: crd_type.plural.clone(),
    }
}

fn not_found_or(err: kube::Error, crd_type: &CrdType, namespace: Option<&str>, name: &str) -> KubeError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => KubeError::NotFound {
            kind: crd_type.kind.clone(),
            namespace: namespace
                .filter(|_| crd_type.scope.is_namespaced())
                .map(String::from),
            name: name.to_string(),
        },
        other => KubeError::Api(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crdform_core::CrdScope;

    #[test]
    fn test_api_resource() {
        let crd_type = CrdType::new("cert-manager.io", "v1", "Certificate", "certificates");
        let resource = api_resource(&crd_type);

        assert_eq!(resource.group, "cert-manager.io");
        assert_eq!(resource.version, "v1");
        assert_eq!(resource.api_version, "cert-manager.io/v1");
        assert_eq!(resource.kind, "Certificate");
        assert_eq!(resource.plural, "certificates");
    }

    #[test]
    fn test_propagation_parse() {
        assert_eq!("Orphan".parse::<Propagation>().unwrap(), Propagation::Orphan);
        assert_eq!("Foreground".parse::<Propagation>().unwrap(), Propagation::Foreground);
        assert!("orphan".parse::<Propagation>().is_err());
    }

    #[test]
    fn test_not_found_mapping() {
        let crd_type = CrdType::new("example.com", "v1", "Gadget", "gadgets")
            .with_scope(CrdScope::Cluster);
        let err = kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "gadgets \"g\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        });

        match not_found_or(err, &crd_type, Some("ignored"), "g") {
            KubeError::NotFound { kind, namespace, name } => {
                assert_eq!(kind, "Gadget");
                assert_eq!(namespace, None);
                assert_eq!(name, "g");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
