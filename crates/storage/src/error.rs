//! Error types for reconciliation.

use rusty_cache_control_common::KeyError;
use rusty_cache_control_policy::PolicyError;
use thiserror::Error;

/// Errors returned by an object store client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Object not found in S3.
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Access denied.
    #[error("Access denied to s3://{bucket}/{key}: {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    /// Request rate exceeded.
    #[error("Throttled: {message}")]
    Throttled { message: String },

    /// Network error.
    #[error("Network error: {message}")]
    NetworkError { message: String, retryable: bool },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl StorageError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::NetworkError { retryable, .. } => *retryable,
            StorageError::Throttled { .. } => true,
            StorageError::NotFound { .. } => false,
            StorageError::AccessDenied { .. } => false,
            StorageError::InvalidConfig { .. } => false,
            StorageError::Other { .. } => false,
        }
    }
}

/// Storage configuration is missing or unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No configuration is registered for the storage.
    #[error("No configuration for storage '{storage_id}'")]
    UnknownStorage { storage_id: String },

    /// Storage configuration names no bucket.
    #[error("Storage '{storage_id}' has no bucket configured")]
    MissingBucket { storage_id: String },

    /// File identifier cannot be turned into an object key.
    #[error("Invalid object key: {0}")]
    InvalidKey(#[from] KeyError),

    /// Cache policy rule table does not compile.
    #[error("Invalid cache policy for storage '{storage_id}': {source}")]
    InvalidPolicy {
        storage_id: String,
        #[source]
        source: PolicyError,
    },

    /// Configuration file could not be read.
    #[error("Cannot read configuration {path}: {message}")]
    Io { path: String, message: String },

    /// Configuration document is malformed.
    #[error("Cannot parse configuration {path}: {message}")]
    Parse { path: String, message: String },
}

/// Errors raised by the file registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Identifier does not resolve to a file.
    #[error("File not found: {identifier}")]
    NotFound { identifier: String },

    /// Registry backend failed.
    #[error("File registry unavailable: {message}")]
    Unavailable { message: String },
}

/// Failure inside a single reconciliation, before it is turned into a skip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Store(#[from] StorageError),
}
