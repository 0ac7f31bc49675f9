//! crdform Provider - the provider surface over the generic CRD adapter
//!
//! Every registered CRD version is served as a resource, a data source and
//! an offline manifest. Configuration and the cluster connection are
//! injected into [`Provider::new`]; failures surface as [`Diagnostics`].

pub mod diagnostics;
pub mod provider;

pub use diagnostics::{Diagnostic, Diagnostics, OFFLINE_SUMMARY, Operation, Severity};
pub use provider::{OpResult, Provider, ProviderMetadata};
