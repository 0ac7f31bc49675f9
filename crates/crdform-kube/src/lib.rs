//! crdform Kube - Kubernetes integration for crdform
//!
//! This crate provides:
//! - **Generic adapter**: `CrdAdapter<S>` reads, applies, deletes and renders
//!   objects of any CRD type
//! - **Cluster seam**: the `ClusterApi` trait with a `kube`-backed
//!   implementation and an in-memory mock
//! - **Connection**: online or offline access, checked before every call
//! - **Provider configuration**: kubeconfig, field manager and conflict settings

pub mod adapter;
pub mod cluster;
pub mod config;
pub mod error;
pub mod mock;

pub use adapter::{Connection, CrdAdapter};
pub use cluster::{ApplyParams, ClusterApi, KubeCluster, Propagation, api_resource};
pub use config::{DEFAULT_FIELD_MANAGER, ProviderConfig};
pub use error::{KubeError, Result};
pub use mock::{MockCluster, OperationCounts, Request};
