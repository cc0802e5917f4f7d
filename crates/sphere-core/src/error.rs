//! Centralized error types for ContactSphere.

use thiserror::Error;

use crate::directory::DirectoryError;
use crate::sync::SyncReport;

/// Main error type for ContactSphere operations.
#[derive(Error, Debug)]
pub enum SphereError {
    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Sync aborted before the last page: {source}")]
    PartialSync {
        report: Box<SyncReport>,
        #[source]
        source: DirectoryError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for ContactSphere operations.
pub type SphereResult<T> = Result<T, SphereError>;

impl SphereError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap a persistence-engine failure.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{:#}", err))
    }
}
