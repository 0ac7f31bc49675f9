//! API coordinates of a custom resource type
//!
//! A [`CrdType`] is everything the generic adapter needs to talk to the API
//! server about one kind: group, version, kind, plural resource name and
//! scope. It also owns the provider-facing naming (type names, ids).

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::naming::{group_segment, to_snake_case};

/// Prefix shared by every type name this provider registers
pub const TYPE_NAME_PREFIX: &str = "k8s";

/// Suffix of the manifest data source type names
pub const MANIFEST_SUFFIX: &str = "manifest";

/// Resource scope - whether objects live in a namespace or cluster-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CrdScope {
    #[default]
    Namespaced,
    Cluster,
}

impl CrdScope {
    pub fn is_namespaced(self) -> bool {
        self == Self::Namespaced
    }
}

impl std::fmt::Display for CrdScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Namespaced => write!(f, "Namespaced"),
            Self::Cluster => write!(f, "Cluster"),
        }
    }
}

/// Ordering of the two halves of a namespaced object's id
///
/// Both orderings exist among the types this provider replaces, so each
/// type declares its own instead of being normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdFormat {
    /// `namespace/name`
    #[default]
    NamespaceName,
    /// `name/namespace`
    NameNamespace,
}

/// The variants registered for every type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Full create/read/update/delete resource
    Resource,
    /// Read-only lookup of an existing object
    DataSource,
    /// Offline YAML rendering
    Manifest,
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resource => write!(f, "resource"),
            Self::DataSource => write!(f, "data source"),
            Self::Manifest => write!(f, "manifest"),
        }
    }
}

/// Group/version/kind/plural of one custom resource version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdType {
    /// API group (e.g., "cert-manager.io"); empty for the core group
    pub group: String,
    /// API version (e.g., "v1")
    pub version: String,
    /// Kind (e.g., "Certificate")
    pub kind: String,
    /// Plural resource name used in the REST path (e.g., "certificates")
    pub plural: String,
    #[serde(default)]
    pub scope: CrdScope,
    #[serde(default)]
    pub id_format: IdFormat,
}

impl CrdType {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
        plural: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
            plural: plural.into(),
            scope: CrdScope::Namespaced,
            id_format: IdFormat::NamespaceName,
        }
    }

    /// Builder: set the scope
    pub fn with_scope(mut self, scope: CrdScope) -> Self {
        self.scope = scope;
        self
    }

    /// Builder: set the id ordering
    pub fn with_id_format(mut self, id_format: IdFormat) -> Self {
        self.id_format = id_format;
        self
    }

    /// `group/version`, or just `version` for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Provider type name for one of the registered variants
    ///
    /// `k8s_cert_manager_io_certificate_v1` for resources and data sources,
    /// `k8s_cert_manager_io_certificate_v1_manifest` for manifests.
    pub fn type_name(&self, kind: TypeKind) -> String {
        let base = format!(
            "{}_{}_{}_{}",
            TYPE_NAME_PREFIX,
            group_segment(&self.group),
            to_snake_case(&self.kind),
            to_snake_case(&self.version)
        );
        match kind {
            TypeKind::Resource | TypeKind::DataSource => base,
            TypeKind::Manifest => format!("{}_{}", base, MANIFEST_SUFFIX),
        }
    }

    /// Compute the id of an object of this type
    pub fn object_id(&self, namespace: Option<&str>, name: &str) -> String {
        match (self.scope, namespace) {
            (CrdScope::Namespaced, Some(ns)) => match self.id_format {
                IdFormat::NamespaceName => format!("{}/{}", ns, name),
                IdFormat::NameNamespace => format!("{}/{}", name, ns),
            },
            _ => name.to_string(),
        }
    }

    /// Split an id back into `(namespace, name)`
    pub fn parse_id(&self, id: &str) -> Result<(Option<String>, String)> {
        let invalid = |reason: &str| CoreError::InvalidId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        if !self.scope.is_namespaced() {
            if id.is_empty() || id.contains('/') {
                return Err(invalid("expected <name> for a cluster-scoped type"));
            }
            return Ok((None, id.to_string()));
        }

        let expected = match self.id_format {
            IdFormat::NamespaceName => "expected <namespace>/<name>",
            IdFormat::NameNamespace => "expected <name>/<namespace>",
        };
        let (first, second) = id.split_once('/').ok_or_else(|| invalid(expected))?;
        if first.is_empty() || second.is_empty() || second.contains('/') {
            return Err(invalid(expected));
        }

        Ok(match self.id_format {
            IdFormat::NamespaceName => (Some(first.to_string()), second.to_string()),
            IdFormat::NameNamespace => (Some(second.to_string()), first.to_string()),
        })
    }
}

impl std::fmt::Display for CrdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}
