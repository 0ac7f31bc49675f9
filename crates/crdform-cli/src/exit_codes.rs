//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions where applicable.

#![allow(dead_code)]

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - configuration or import id rejected before any cluster call
pub const VALIDATION_ERROR: i32 = 2;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Cluster error - the API server rejected the call, or the provider is offline
pub const CLUSTER_ERROR: i32 = 6;
