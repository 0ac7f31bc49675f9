//! Error types for crdform-kube

use thiserror::Error;

/// Result type for crdform-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur during Kubernetes operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Object not found
    #[error("{kind} '{name}' not found{}", .namespace.as_ref().map(|ns| format!(" in namespace '{}'", ns)).unwrap_or_default())]
    NotFound {
        kind: String,
        namespace: Option<String>,
        name: String,
    },

    /// A cluster call was attempted while the provider runs without cluster access
    #[error("cannot {operation} while the provider is in offline mode")]
    Offline { operation: String },

    /// Failed to turn a typed object into JSON
    #[error("marshal error: {0}")]
    Marshal(String),

    /// Failed to turn a JSON response into a typed object
    #[error("unmarshal error: {0}")]
    Unmarshal(String),

    /// Error from the core crate (CRD parsing, ids, validation)
    #[error(transparent)]
    Core(crdform_core::CoreError),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Kubeconfig could not be loaded
    #[error("kubeconfig error: {0}")]
    Kubeconfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crdform_core::CoreError> for KubeError {
    fn from(e: crdform_core::CoreError) -> Self {
        match e {
            crdform_core::CoreError::Marshal { message } => KubeError::Marshal(message),
            crdform_core::CoreError::Unmarshal { message } => KubeError::Unmarshal(message),
            other => KubeError::Core(other),
        }
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::InvalidConfig(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a not-found condition (typed or a raw 404)
    pub fn is_not_found(&self) -> bool {
        match self {
            KubeError::NotFound { .. } => true,
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 409)
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, KubeError::Offline { .. })
    }
}
