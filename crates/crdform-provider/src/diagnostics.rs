//! User-facing diagnostics
//!
//! Every failure leaves the provider as a [`Diagnostic`]. Cluster and
//! conversion failures share one template so that users always see which
//! step failed and the underlying error text.

use serde::Serialize;
use thiserror::Error;

use crdform_core::{CoreError, ValidationIssue};
use crdform_kube::KubeError;

/// Summary of the diagnostic raised for offline mode
pub const OFFLINE_SUMMARY: &str = "Provider in Offline Mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A provider operation, used to phrase diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
    ReadDataSource,
    RenderManifest,
}

impl Operation {
    /// What the provider was doing, as in "while creating the resource"
    pub fn action(self) -> &'static str {
        match self {
            Operation::Create => "creating the resource",
            Operation::Read => "reading the resource",
            Operation::Update => "updating the resource",
            Operation::Delete => "deleting the resource",
            Operation::Import => "importing the resource",
            Operation::ReadDataSource => "reading the data source",
            Operation::RenderManifest => "rendering the manifest",
        }
    }

    /// The HTTP verb this operation issues
    fn request(self) -> &'static str {
        match self {
            Operation::Create | Operation::Update => "PATCH",
            Operation::Read | Operation::Import | Operation::ReadDataSource => "GET",
            Operation::Delete => "DELETE",
            Operation::RenderManifest => "render",
        }
    }
}

/// One diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Attribute path the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary, detail)
        }
    }

    pub fn with_attribute(mut self, path: impl Into<String>) -> Self {
        self.attribute = Some(path.into());
        self
    }

    /// The fixed diagnostic for any cluster call in offline mode
    pub fn offline(operation: Operation) -> Self {
        Self::error(
            OFFLINE_SUMMARY,
            format!(
                "The provider is configured in offline mode and cannot contact the cluster while {}. \
                 Only manifest data sources are available in offline mode.",
                operation.action()
            ),
        )
    }

    /// A failed step of `operation`
    ///
    /// `verb` names the step (`PATCH`, `marshal`, ...).
    pub fn unexpected(operation: Operation, verb: &str, err: impl std::fmt::Display) -> Self {
        Self::error(
            format!("Unable to {} resource", verb),
            format!(
                "An unexpected error occurred while {}. \
                 Please report this issue to the provider developers.\n\n{} Error: {}",
                operation.action(),
                verb,
                err
            ),
        )
    }

    /// Diagnostic for an adapter error
    pub fn from_kube_error(operation: Operation, err: &KubeError) -> Self {
        match err {
            KubeError::Offline { .. } => Self::offline(operation),
            KubeError::Marshal(_) => Self::unexpected(operation, "marshal", err),
            KubeError::Unmarshal(_) => Self::unexpected(operation, "unmarshal", err),
            KubeError::Core(core) => Self::from_core_error(operation, core),
            _ => Self::unexpected(operation, operation.request(), err),
        }
    }

    /// Diagnostic for a conversion or lookup error
    pub fn from_core_error(operation: Operation, err: &CoreError) -> Self {
        match err {
            CoreError::Marshal { .. } => Self::unexpected(operation, "marshal", err),
            CoreError::Unmarshal { .. } => Self::unexpected(operation, "unmarshal", err),
            CoreError::UnknownType { name } => Self::error(
                "Unknown Type",
                format!("The provider does not serve a type named '{}'.", name),
            ),
            CoreError::InvalidId { id, reason } => Self::error(
                "Invalid Import ID",
                format!("The import id '{}' is not valid: {}.", id, reason),
            ),
            CoreError::InvalidAttribute { path, message } => {
                Self::error("Invalid Attribute Value", message.clone()).with_attribute(path.clone())
            }
            CoreError::MissingField { field } => Self::error(
                "Missing Required Attribute",
                format!("The attribute '{}' must be set.", field),
            )
            .with_attribute(field.clone()),
            _ => Self::unexpected(operation, operation.request(), err),
        }
    }

    /// Diagnostic for one configuration validation issue
    pub fn from_validation_issue(issue: &ValidationIssue) -> Self {
        Self::error("Invalid Attribute Configuration", issue.message.clone())
            .with_attribute(issue.path.clone())
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        write!(f, "{}: {}", label, self.summary)?;
        if let Some(path) = &self.attribute {
            write!(f, " ({})", path)?;
        }
        if !self.detail.is_empty() {
            write!(f, "\n\n{}", self.detail)?;
        }
        Ok(())
    }
}

/// The diagnostics of one failed operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("{}", render(.0))]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// True if the only error is the offline diagnostic
    pub fn is_offline(&self) -> bool {
        self.0
            .iter()
            .filter(|d| d.is_error())
            .all(|d| d.summary == OFFLINE_SUMMARY)
            && self.has_errors()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self(diagnostics)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
