//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("failed to marshal object: {message}")]
    Marshal { message: String },

    #[error("failed to unmarshal object: {message}")]
    Unmarshal { message: String },

    #[error("Invalid CustomResourceDefinition: {message}")]
    InvalidCrd { message: String },

    #[error("Unknown type: {name}")]
    UnknownType { name: String },

    #[error("Type '{name}' is registered more than once")]
    DuplicateType { name: String },

    #[error("Invalid id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    #[error("Invalid attribute '{path}': {message}")]
    InvalidAttribute { path: String, message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn marshal(err: impl std::fmt::Display) -> Self {
        Self::Marshal {
            message: err.to_string(),
        }
    }

    pub fn unmarshal(err: impl std::fmt::Display) -> Self {
        Self::Unmarshal {
            message: err.to_string(),
        }
    }

    pub fn invalid_crd(message: impl Into<String>) -> Self {
        Self::InvalidCrd {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
