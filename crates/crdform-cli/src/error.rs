//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use thiserror::Error;

use crdform_core::CoreError;
use crdform_kube::KubeError;
use crdform_provider::Diagnostics;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration rejected before any cluster call
    #[error("Validation failed: {message}")]
    #[diagnostic(code(crdform::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// CRD files could not be loaded into the registry
    #[error("CRD error: {message}")]
    #[diagnostic(code(crdform::cli::crd))]
    Crd {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Provider configuration or kubeconfig problem
    #[error("Configuration error: {message}")]
    #[diagnostic(code(crdform::cli::config))]
    Config { message: String },

    /// The cluster call failed, or the provider is offline
    #[error("{message}")]
    #[diagnostic(code(crdform::cli::cluster))]
    Cluster {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(crdform::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(crdform::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Crd { .. } => exit_codes::ERROR,
            CliError::Config { .. } => exit_codes::ERROR,
            CliError::Cluster { .. } => exit_codes::CLUSTER_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify the diagnostics of a failed provider operation
    ///
    /// Diagnostics that point at an attribute, or reject the type name or
    /// import id, were raised before any cluster call.
    pub fn from_diagnostics(diagnostics: &Diagnostics) -> Self {
        let message = diagnostics.to_string();
        let pre_flight = diagnostics.iter().filter(|d| d.is_error()).all(|d| {
            d.attribute.is_some()
                || d.summary == "Unknown Type"
                || d.summary == "Invalid Import ID"
                || d.summary == "Resource Replacement Required"
        });

        if diagnostics.is_offline() {
            Self::Cluster {
                message,
                help: Some("remove --offline (or `offline: true` from the provider config) to reach the cluster".to_string()),
            }
        } else if pre_flight {
            Self::Validation {
                message,
                help: None,
            }
        } else {
            Self::Cluster {
                message,
                help: None,
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => e.into(),
            CoreError::UnknownType { .. } | CoreError::InvalidId { .. } => Self::Validation {
                message: err.to_string(),
                help: Some("run `crdform types` to list the served type names".to_string()),
            },
            other => Self::Crd {
                message: other.to_string(),
                help: Some("pass CustomResourceDefinition files or directories with --crds".to_string()),
            },
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::Io(e) => e.into(),
            KubeError::InvalidConfig(_) | KubeError::Kubeconfig(_) => Self::Config {
                message: err.to_string(),
            },
            other => Self::Cluster {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

impl From<Diagnostics> for CliError {
    fn from(diagnostics: Diagnostics) -> Self {
        Self::from_diagnostics(&diagnostics)
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crdform_provider::{Diagnostic, Operation};

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::validation("x").exit_code(), 2);
        assert_eq!(CliError::internal("x").exit_code(), 1);
        assert_eq!(
            CliError::from(std::io::Error::other("disk full")).exit_code(),
            5
        );
    }

    #[test]
    fn test_offline_diagnostics_are_cluster_errors() {
        let diagnostics = Diagnostics::from(Diagnostic::offline(Operation::Create));
        let err = CliError::from(diagnostics);
        assert_eq!(err.exit_code(), exit_codes::CLUSTER_ERROR);
        assert!(err.to_string().contains("Provider in Offline Mode"));
    }

    #[test]
    fn test_attribute_diagnostics_are_validation_errors() {
        let diagnostics = Diagnostics::from(
            Diagnostic::error("Invalid Attribute Configuration", "attribute is required")
                .with_attribute("metadata.name"),
        );
        assert_eq!(CliError::from(diagnostics).exit_code(), exit_codes::VALIDATION_ERROR);
    }

    #[test]
    fn test_core_errors() {
        let err = CliError::from(CoreError::UnknownType {
            name: "k8s_nope_v1".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_ERROR);

        let err = CliError::from(CoreError::invalid_crd("Missing 'spec' field"));
        assert_eq!(err.exit_code(), exit_codes::ERROR);
    }
}
