//! Provider configuration
//!
//! Stored as YAML in `~/.config/crdform/provider.yaml` by default. Every
//! setting can also be overridden from the command line.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crdform_core::IdFormat;

use crate::error::{KubeError, Result};

/// Default field manager for server-side apply
pub const DEFAULT_FIELD_MANAGER: &str = "crdform";

/// Provider configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Never touch the cluster; only manifests can be rendered
    #[serde(default)]
    pub offline: bool,

    /// Path to a kubeconfig file (defaults to the usual discovery)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Field manager used for server-side apply
    #[serde(default = "default_field_manager")]
    pub field_manager: String,

    /// Take ownership of conflicting fields during server-side apply
    #[serde(default)]
    pub force_conflicts: bool,

    /// Per-type id ordering overrides, keyed by type name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub id_formats: BTreeMap<String, IdFormat>,

    /// CRD files or directories to register
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crds: Vec<PathBuf>,
}

fn default_field_manager() -> String {
    DEFAULT_FIELD_MANAGER.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            offline: false,
            kubeconfig: None,
            context: None,
            field_manager: default_field_manager(),
            force_conflicts: false,
            id_formats: BTreeMap::new(),
            crds: Vec::new(),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("crdform").join("provider.yaml"))
    }

    /// Check settings that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.field_manager.trim().is_empty() {
            return Err(KubeError::InvalidConfig(
                "fieldManager must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert!(!config.offline);
        assert!(!config.force_conflicts);
        assert_eq!(config.field_manager, DEFAULT_FIELD_MANAGER);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: ProviderConfig = serde_yaml::from_str("offline: true\n").unwrap();
        assert!(config.offline);
        assert_eq!(config.field_manager, "crdform");
        assert!(config.id_formats.is_empty());
    }

    #[test]
    fn test_id_format_overrides() {
        let yaml = "idFormats:\n  k8s_example_com_widget_v1: nameNamespace\n";
        let config: ProviderConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.id_formats.get("k8s_example_com_widget_v1"),
            Some(&IdFormat::NameNamespace)
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("provider.yaml");

        let config = ProviderConfig {
            context: Some("kind-dev".to_string()),
            force_conflicts: true,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = ProviderConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_empty_field_manager_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider.yaml");
        std::fs::write(&path, "fieldManager: ''\n").unwrap();

        let err = ProviderConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("fieldManager"));
    }
}
