//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rusty_cache_control_policy::{PolicyConfig, PolicyRule, RuleTarget};
use rusty_cache_control_storage::{
    ConfigurationError, FileRef, FileRegistry, MetadataReplacement, RegistryError,
    RemoteObjectSnapshot, StaticStorageConfigs, StorageClient, StorageConfig,
    StorageConfigProvider, StorageError,
};

pub const BUCKET: &str = "my-bucket";
pub const STORAGE: &str = "1";

/// A recorded COPY request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyCall {
    pub bucket: String,
    pub key: String,
    pub replacement: MetadataReplacement,
}

/// Object store double that records calls and applies metadata copies.
#[derive(Debug, Default)]
pub struct MemoryStorageClient {
    objects: Mutex<HashMap<(String, String), RemoteObjectSnapshot>>,
    head_failures: Mutex<HashMap<String, StorageError>>,
    copy_failures: Mutex<HashMap<String, StorageError>>,
    heads: Mutex<Vec<String>>,
    copies: Mutex<Vec<CopyCall>>,
}

impl MemoryStorageClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object.
    pub fn insert(&self, bucket: &str, key: &str, snapshot: RemoteObjectSnapshot) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), snapshot);
    }

    /// Current state of an object.
    pub fn object(&self, bucket: &str, key: &str) -> Option<RemoteObjectSnapshot> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Make HEAD requests for `key` fail.
    pub fn fail_head(&self, key: &str, error: StorageError) {
        self.head_failures
            .lock()
            .unwrap()
            .insert(key.to_string(), error);
    }

    /// Make COPY requests for `key` fail.
    pub fn fail_copy(&self, key: &str, error: StorageError) {
        self.copy_failures
            .lock()
            .unwrap()
            .insert(key.to_string(), error);
    }

    pub fn head_calls(&self) -> Vec<String> {
        self.heads.lock().unwrap().clone()
    }

    pub fn copy_calls(&self) -> Vec<CopyCall> {
        self.copies.lock().unwrap().clone()
    }

    pub fn remote_calls(&self) -> usize {
        self.heads.lock().unwrap().len() + self.copies.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageClient for MemoryStorageClient {
    async fn head_object_with_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<RemoteObjectSnapshot>, StorageError> {
        self.heads.lock().unwrap().push(key.to_string());
        if let Some(err) = self.head_failures.lock().unwrap().get(key) {
            return Err(err.clone());
        }
        Ok(self.object(bucket, key))
    }

    async fn copy_object_metadata(
        &self,
        bucket: &str,
        key: &str,
        replacement: &MetadataReplacement,
    ) -> Result<(), StorageError> {
        self.copies.lock().unwrap().push(CopyCall {
            bucket: bucket.to_string(),
            key: key.to_string(),
            replacement: replacement.clone(),
        });
        if let Some(err) = self.copy_failures.lock().unwrap().get(key) {
            return Err(err.clone());
        }

        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get_mut(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        // REPLACE semantics: the new set is exactly what was sent.
        object.cache_control = Some(replacement.cache_control.clone());
        object.content_type = replacement.content_type.clone();
        object.content_encoding = replacement.content_encoding.clone();
        object.content_disposition = replacement.content_disposition.clone();
        object.content_language = replacement.content_language.clone();
        object.expires = replacement.expires.clone();
        object.website_redirect_location = replacement.website_redirect_location.clone();
        object.storage_class = replacement.storage_class.clone();
        object.server_side_encryption = replacement.server_side_encryption.clone();
        object.ssekms_key_id = replacement.ssekms_key_id.clone();
        object.bucket_key_enabled = replacement.bucket_key_enabled;
        object.metadata = replacement.metadata.clone();
        Ok(())
    }
}

/// Configuration provider that counts lookups.
#[derive(Debug)]
pub struct CountingConfigs {
    inner: StaticStorageConfigs,
    lookups: AtomicUsize,
}

impl CountingConfigs {
    pub fn new(inner: StaticStorageConfigs) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl StorageConfigProvider for CountingConfigs {
    fn config_for(&self, storage_id: &str) -> Result<StorageConfig, ConfigurationError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.config_for(storage_id)
    }
}

/// File registry double.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    files: HashMap<String, FileRef>,
    derivatives: HashMap<String, Vec<FileRef>>,
    broken_listing: bool,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: FileRef) {
        if let Some(original) = &file.original {
            self.derivatives
                .entry(original.identifier.clone())
                .or_default()
                .push(file.clone());
        }
        self.files.insert(file.identifier.clone(), file);
    }

    pub fn break_listing(&mut self) {
        self.broken_listing = true;
    }
}

impl FileRegistry for MemoryRegistry {
    fn resolve(&self, identifier: &str) -> Result<FileRef, RegistryError> {
        self.files
            .get(identifier)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                identifier: identifier.to_string(),
            })
    }

    fn list_derivatives(&self, original: &FileRef) -> Result<Vec<FileRef>, RegistryError> {
        if self.broken_listing {
            return Err(RegistryError::Unavailable {
                message: "database gone".to_string(),
            });
        }
        Ok(self
            .derivatives
            .get(&original.identifier)
            .cloned()
            .unwrap_or_default())
    }
}

/// Policy used by most tests: images cached for 30 days, derivatives for 7.
pub fn image_policy() -> PolicyConfig {
    PolicyConfig::default()
        .with_rule(
            PolicyRule::new("public, max-age=604800")
                .with_path_patterns(["thumbs/**"])
                .applies_to(RuleTarget::Derived),
        )
        .with_rule(PolicyRule::new("public, max-age=2592000").with_extensions(["png", "jpg"]))
}

/// Storage "1" in `my-bucket` under `cdn-assets`, with [`image_policy`].
pub fn s3_storage() -> StorageConfig {
    StorageConfig::new(STORAGE, BUCKET)
        .with_base_path("cdn-assets")
        .with_cache_policy(image_policy())
}

pub fn configs() -> StaticStorageConfigs {
    StaticStorageConfigs::from_configs([s3_storage()])
}

/// Snapshot of a KMS-encrypted, infrequent-access PNG with custom metadata.
pub fn png_snapshot(cache_control: Option<&str>) -> RemoteObjectSnapshot {
    RemoteObjectSnapshot {
        cache_control: cache_control.map(str::to_string),
        content_type: Some("image/png".to_string()),
        content_encoding: Some("identity".to_string()),
        content_disposition: Some("inline; filename=\"logo.png\"".to_string()),
        content_language: Some("en-GB".to_string()),
        expires: Some("Thu, 01 Jan 2037 00:00:00 GMT".to_string()),
        website_redirect_location: Some("/images/logo-v2.png".to_string()),
        storage_class: Some("STANDARD_IA".to_string()),
        server_side_encryption: Some("aws:kms".to_string()),
        ssekms_key_id: Some("arn:aws:kms:eu-west-1:111122223333:key/logo".to_string()),
        bucket_key_enabled: Some(true),
        metadata: HashMap::from([
            ("uploaded-by".to_string(), "editor".to_string()),
            ("checksum".to_string(), "abc123".to_string()),
        ]),
        last_modified: Some(1_700_000_000),
        ..Default::default()
    }
}

pub fn network_error() -> StorageError {
    StorageError::NetworkError {
        message: "connection reset".to_string(),
        retryable: true,
    }
}
