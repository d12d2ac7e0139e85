//! Capabilities supplied by collaborators.

use async_trait::async_trait;

use crate::error::{ConfigurationError, RegistryError, StorageError};
use crate::types::{FileRef, MetadataReplacement, RemoteObjectSnapshot, StorageConfig};

/// Low-level S3 operations - implemented by each backend.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Expected bucket owner for security validation, if any.
    fn expected_bucket_owner(&self) -> Option<&str> {
        None
    }

    /// Fetch an object's headers and user metadata.
    /// Returns None if object doesn't exist.
    async fn head_object_with_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<RemoteObjectSnapshot>, StorageError>;

    /// Copy an object onto itself, replacing its whole metadata set.
    async fn copy_object_metadata(
        &self,
        bucket: &str,
        key: &str,
        replacement: &MetadataReplacement,
    ) -> Result<(), StorageError>;
}

/// Looks up the configuration of a storage.
pub trait StorageConfigProvider: Send + Sync {
    /// Configuration for `storage_id`.
    fn config_for(&self, storage_id: &str) -> Result<StorageConfig, ConfigurationError>;
}

/// Host file registry.
pub trait FileRegistry: Send + Sync {
    /// Resolve an identifier to a file.
    fn resolve(&self, identifier: &str) -> Result<FileRef, RegistryError>;

    /// All known derivatives of an original file.
    fn list_derivatives(&self, original: &FileRef) -> Result<Vec<FileRef>, RegistryError>;
}
