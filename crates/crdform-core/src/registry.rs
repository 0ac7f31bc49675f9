//! Registry of the types this provider serves
//!
//! Each served CRD version registers one base type name, used by both the
//! resource and the data source, plus a `_manifest` variant.

use std::path::Path;

use indexmap::IndexMap;
use walkdir::WalkDir;

use crate::crd::{CrdDefinition, CrdParser, CrdVersion};
use crate::error::{CoreError, Result};
use crate::schema::{Schema, SchemaBuilder};
use crate::target::{CrdType, IdFormat, MANIFEST_SUFFIX, TypeKind};

/// One registered CRD version
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredType {
    pub crd_type: CrdType,
    /// CRD version definition; `None` for types registered without a schema
    pub version: Option<CrdVersion>,
}

impl RegisteredType {
    pub fn schema(&self, kind: TypeKind) -> Schema {
        SchemaBuilder::new(&self.crd_type, self.version.as_ref()).build(kind)
    }

    pub fn is_deprecated(&self) -> bool {
        self.version.as_ref().is_some_and(|v| v.deprecated)
    }
}

/// All types known to the provider, keyed by base type name
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, RegisteredType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one type
    pub fn register(&mut self, crd_type: CrdType, version: Option<CrdVersion>) -> Result<()> {
        let name = crd_type.type_name(TypeKind::Resource);
        if self.types.contains_key(&name) {
            return Err(CoreError::DuplicateType { name });
        }
        tracing::debug!(type_name = %name, api_version = %crd_type.api_version(), "registered type");
        self.types.insert(name, RegisteredType { crd_type, version });
        Ok(())
    }

    /// Register every served version of a CRD, returning how many were added
    pub fn register_crd(&mut self, crd: &CrdDefinition, id_format: IdFormat) -> Result<usize> {
        let mut added = 0;
        for (crd_type, version) in crd.crd_types(id_format) {
            self.register(crd_type, Some(version.clone()))?;
            added += 1;
        }
        tracing::debug!(crd = %crd.name, versions = added, "registered CRD");
        Ok(added)
    }

    /// Register all CRDs found in a YAML string
    pub fn load_str(&mut self, yaml: &str) -> Result<usize> {
        let mut added = 0;
        for crd in CrdParser::parse_all(yaml)? {
            added += self.register_crd(&crd, IdFormat::default())?;
        }
        Ok(added)
    }

    /// Register all CRDs in a file, or in every `.yaml`/`.yml` file below a
    /// directory
    pub fn load_path(&mut self, path: &Path) -> Result<usize> {
        if path.is_file() {
            let content = std::fs::read_to_string(path)?;
            return self.load_str(&content).map_err(|e| match e {
                CoreError::InvalidCrd { message } => CoreError::InvalidCrd {
                    message: format!("{}: {}", path.display(), message),
                },
                other => other,
            });
        }

        let mut files: Vec<_> = WalkDir::new(path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();
        files.sort();

        if files.is_empty() && !path.exists() {
            return Err(CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        let mut added = 0;
        for file in files {
            added += self.load_path(&file)?;
        }
        Ok(added)
    }

    /// Override the id ordering of a registered type
    pub fn set_id_format(&mut self, type_name: &str, id_format: IdFormat) -> Result<()> {
        let registered = self
            .types
            .get_mut(type_name)
            .ok_or_else(|| CoreError::UnknownType {
                name: type_name.to_string(),
            })?;
        registered.crd_type.id_format = id_format;
        Ok(())
    }

    /// Find the type behind a type name of the given kind
    pub fn get(&self, type_name: &str, kind: TypeKind) -> Result<&RegisteredType> {
        let base = match kind {
            TypeKind::Manifest => type_name
                .strip_suffix(MANIFEST_SUFFIX)
                .and_then(|s| s.strip_suffix('_')),
            TypeKind::Resource | TypeKind::DataSource => Some(type_name),
        };

        base.and_then(|b| self.types.get(b))
            .ok_or_else(|| CoreError::UnknownType {
                name: type_name.to_string(),
            })
    }

    /// Type names of one kind, in registration order
    pub fn type_names(&self, kind: TypeKind) -> Vec<String> {
        self.types
            .values()
            .map(|t| t.crd_type.type_name(kind))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ISSUER_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: issuers.cert-manager.io
spec:
  group: cert-manager.io
  scope: Namespaced
  names:
    kind: Issuer
    plural: issuers
  versions:
    - name: v1
      served: true
      storage: true
    - name: v1beta1
      served: true
      storage: false
      deprecated: true
"#;

    const CLUSTER_ISSUER_CRD: &str = r#"
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

    #[test]
    fn test_load_str_registers_served_versions() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.load_str(ISSUER_CRD).unwrap(), 2);

        assert_eq!(
            registry.type_names(TypeKind::Resource),
            vec![
                "k8s_cert_manager_io_issuer_v1",
                "k8s_cert_manager_io_issuer_v1beta1"
            ]
        );
        assert_eq!(
            registry.type_names(TypeKind::Manifest),
            vec![
                "k8s_cert_manager_io_issuer_v1_manifest",
                "k8s_cert_manager_io_issuer_v1beta1_manifest"
            ]
        );

        let v1beta1 = registry
            .get("k8s_cert_manager_io_issuer_v1beta1", TypeKind::DataSource)
            .unwrap();
        assert!(v1beta1.is_deprecated());
    }

    #[test]
    fn test_get_by_kind() {
        let mut registry = TypeRegistry::new();
        registry.load_str(ISSUER_CRD).unwrap();

        assert!(registry.get("k8s_cert_manager_io_issuer_v1_manifest", TypeKind::Manifest).is_ok());
        assert!(registry.get("k8s_cert_manager_io_issuer_v1", TypeKind::Manifest).is_err());
        assert!(registry.get("k8s_cert_manager_io_issuer_v1_manifest", TypeKind::Resource).is_err());
        assert!(matches!(
            registry.get("k8s_nope_v1", TypeKind::Resource),
            Err(CoreError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = TypeRegistry::new();
        registry.load_str(ISSUER_CRD).unwrap();
        let err = registry.load_str(ISSUER_CRD).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateType { .. }));
    }

    #[test]
    fn test_set_id_format() {
        let mut registry = TypeRegistry::new();
        registry.load_str(ISSUER_CRD).unwrap();
        registry
            .set_id_format("k8s_cert_manager_io_issuer_v1", IdFormat::NameNamespace)
            .unwrap();

        let issuer = registry
            .get("k8s_cert_manager_io_issuer_v1", TypeKind::Resource)
            .unwrap();
        assert_eq!(issuer.crd_type.object_id(Some("ns"), "ca"), "ca/ns");
        assert!(registry.set_id_format("k8s_missing_v1", IdFormat::NameNamespace).is_err());
    }

    #[test]
    fn test_load_path_walks_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("issuer.yaml"), ISSUER_CRD).unwrap();
        fs::write(dir.path().join("nested/cluster-issuer.yml"), CLUSTER_ISSUER_CRD).unwrap();
        fs::write(dir.path().join("README.md"), "# not a crd").unwrap();

        let mut registry = TypeRegistry::new();
        assert_eq!(registry.load_path(dir.path()).unwrap(), 3);

        let cluster_issuer = registry
            .get("k8s_cert_manager_io_cluster_issuer_v1", TypeKind::Resource)
            .unwrap();
        assert!(!cluster_issuer.crd_type.scope.is_namespaced());
    }

    #[test]
    fn test_load_path_missing() {
        let mut registry = TypeRegistry::new();
        assert!(registry.load_path(Path::new("/definitely/not/here")).is_err());
    }
}
