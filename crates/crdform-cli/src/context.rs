//! Provider construction from global flags
//!
//! Precedence: command-line flags and environment variables, then the
//! provider config file, then defaults.

use std::path::PathBuf;

use clap::Args;
use crdform_core::TypeRegistry;
use crdform_kube::{Connection, KubeCluster, ProviderConfig};
use crdform_provider::Provider;

use crate::error::{CliError, Result};

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// CustomResourceDefinition files or directories (repeatable)
    #[arg(long = "crds", global = true, env = "CRDFORM_CRDS", value_delimiter = ',')]
    pub crds: Vec<PathBuf>,

    /// Provider config file (default: ~/.config/crdform/provider.yaml)
    #[arg(long, global = true, env = "CRDFORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Never contact the cluster; only manifests can be rendered
    #[arg(long, global = true, env = "CRDFORM_OFFLINE")]
    pub offline: bool,

    /// Path to the kubeconfig file
    #[arg(long, global = true, env = "CRDFORM_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true, env = "CRDFORM_CONTEXT")]
    pub context: Option<String>,

    /// Field manager for server-side apply
    #[arg(long, global = true, env = "CRDFORM_FIELD_MANAGER")]
    pub field_manager: Option<String>,

    /// Take ownership of fields managed by someone else
    #[arg(long, global = true, env = "CRDFORM_FORCE_CONFLICTS")]
    pub force_conflicts: bool,
}

impl GlobalArgs {
    /// Resolve the provider configuration
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let mut config = match &self.config {
            Some(path) => ProviderConfig::load_from(path)?,
            None => ProviderConfig::load()?,
        };

        if self.offline {
            config.offline = true;
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            config.kubeconfig = Some(kubeconfig.clone());
        }
        if let Some(context) = &self.context {
            config.context = Some(context.clone());
        }
        if let Some(field_manager) = &self.field_manager {
            config.field_manager = field_manager.clone();
        }
        if self.force_conflicts {
            config.force_conflicts = true;
        }
        config.crds.extend(self.crds.iter().cloned());

        config.validate()?;
        Ok(config)
    }

    /// Load every configured CRD into a registry
    pub fn registry(&self, config: &ProviderConfig) -> Result<TypeRegistry> {
        if config.crds.is_empty() {
            return Err(CliError::Crd {
                message: "no CustomResourceDefinitions configured".to_string(),
                help: Some(
                    "pass --crds <file-or-directory>, or list them under `crds:` in the provider config"
                        .to_string(),
                ),
            });
        }

        let mut registry = TypeRegistry::new();
        for path in &config.crds {
            let count = registry.load_path(path)?;
            tracing::debug!(path = %path.display(), count, "registered CRD versions");
        }
        for (type_name, id_format) in &config.id_formats {
            registry.set_id_format(type_name, *id_format)?;
        }
        Ok(registry)
    }

    /// Build a provider that never touches the cluster
    pub fn offline_provider(&self) -> Result<Provider> {
        let config = self.provider_config()?;
        let registry = self.registry(&config)?;
        Ok(Provider::new(registry, config, Connection::Offline))
    }

    /// Build a provider connected to the configured cluster
    ///
    /// In offline mode no connection is attempted.
    pub async fn provider(&self) -> Result<Provider> {
        let config = self.provider_config()?;
        let registry = self.registry(&config)?;

        let connection = if config.offline {
            Connection::Offline
        } else {
            Connection::online(KubeCluster::connect(&config).await?)
        };
        Ok(Provider::new(registry, config, connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crdform_core::IdFormat;
    use tempfile::TempDir;

    fn fixtures() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures"))
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider.yaml");
        std::fs::write(&path, "fieldManager: from-file\ncontext: file-ctx\n").unwrap();

        let args = GlobalArgs {
            config: Some(path),
            field_manager: Some("from-flag".to_string()),
            force_conflicts: true,
            ..Default::default()
        };
        let config = args.provider_config().unwrap();

        assert_eq!(config.field_manager, "from-flag");
        assert_eq!(config.context.as_deref(), Some("file-ctx"));
        assert!(config.force_conflicts);
        assert!(!config.offline);
    }

    #[test]
    fn test_registry_applies_id_formats() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider.yaml");
        std::fs::write(
            &path,
            "idFormats:\n  k8s_cert_manager_io_certificate_v1: nameNamespace\n",
        )
        .unwrap();

        let args = GlobalArgs {
            config: Some(path),
            crds: vec![fixtures().join("crds")],
            ..Default::default()
        };
        let config = args.provider_config().unwrap();
        let registry = args.registry(&config).unwrap();

        let certificate = registry
            .get(
                "k8s_cert_manager_io_certificate_v1",
                crdform_core::TypeKind::Resource,
            )
            .unwrap();
        assert_eq!(certificate.crd_type.id_format, IdFormat::NameNamespace);
    }

    #[test]
    fn test_registry_requires_crds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider.yaml");
        std::fs::write(&path, "offline: true\n").unwrap();

        let args = GlobalArgs {
            config: Some(path),
            ..Default::default()
        };
        let config = args.provider_config().unwrap();
        assert!(matches!(args.registry(&config), Err(CliError::Crd { .. })));
    }
}
