//! Shared data structures for reconciliation.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use rusty_cache_control_common::{DEFAULT_OPERATION_TIMEOUT_SECS, S3_DRIVER_KEY};
use rusty_cache_control_policy::{PolicyConfig, PolicyResolver};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, StorageError};

/// A file known to the host file registry.
///
/// Derivatives carry their original, so "derived" and "has an original" can
/// never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Path-like identifier, unique within its storage.
    pub identifier: String,
    /// Storage the file lives in.
    pub storage_id: String,
    /// Original file, present iff this file is a derivative.
    pub original: Option<Box<FileRef>>,
    /// Local modification time (Unix epoch seconds).
    pub modified_at: i64,
}

impl FileRef {
    /// Create a reference to an original file.
    pub fn original(identifier: impl Into<String>, storage_id: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            storage_id: storage_id.into(),
            original: None,
            modified_at: 0,
        }
    }

    /// Create a derivative of `original` living in the same storage.
    pub fn derived(identifier: impl Into<String>, original: FileRef) -> Self {
        Self {
            identifier: identifier.into(),
            storage_id: original.storage_id.clone(),
            original: Some(Box::new(original)),
            modified_at: 0,
        }
    }

    /// Set the modification time.
    pub fn with_modified_at(mut self, modified_at: i64) -> Self {
        self.modified_at = modified_at;
        self
    }

    /// Whether this file is a derivative.
    pub fn is_derived(&self) -> bool {
        self.original.is_some()
    }

    /// Path and derived flag the cache policy is computed from.
    ///
    /// Derivatives live at their own key but inherit the original's policy.
    pub fn policy_subject(&self) -> (&str, bool) {
        match &self.original {
            Some(original) => (original.identifier.as_str(), true),
            None => (self.identifier.as_str(), false),
        }
    }
}

/// AWS credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_driver() -> String {
    S3_DRIVER_KEY.to_string()
}

/// Per-storage configuration, as stored by the host for each storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage identifier used by the file registry.
    pub storage_id: String,
    /// Driver the storage is served by.
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Target bucket.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Prefix prepended to every object key.
    #[serde(default)]
    pub base_path: Option<String>,
    /// AWS region.
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint URL for S3-compatible stores.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Use path-style addressing (most S3-compatible stores need this).
    #[serde(default)]
    pub force_path_style: bool,
    /// Static credentials; the default credential chain is used when absent.
    #[serde(default)]
    pub credentials: Option<AwsCredentials>,
    /// Expected bucket owner for security validation.
    #[serde(default)]
    pub expected_bucket_owner: Option<String>,
    /// Timeout of each store call in seconds; 30 when absent.
    #[serde(default)]
    pub operation_timeout_secs: Option<u64>,
    /// Cache-Control rule table for files of this storage.
    #[serde(default)]
    pub cache_policy: PolicyConfig,
}

impl StorageConfig {
    /// Create a configuration for an S3 storage.
    pub fn new(storage_id: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            storage_id: storage_id.into(),
            driver: default_driver(),
            bucket: Some(bucket.into()),
            base_path: None,
            region: None,
            endpoint: None,
            force_path_style: false,
            credentials: None,
            expected_bucket_owner: None,
            operation_timeout_secs: None,
            cache_policy: PolicyConfig::default(),
        }
    }

    /// Set the key prefix.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Set the driver key.
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    /// Set the cache policy rule table.
    pub fn with_cache_policy(mut self, policy: PolicyConfig) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Configured bucket.
    ///
    /// # Errors
    /// Returns error if no bucket, or a blank one, is configured.
    pub fn require_bucket(&self) -> Result<&str, ConfigurationError> {
        match self.bucket.as_deref().map(str::trim) {
            Some(bucket) if !bucket.is_empty() => Ok(bucket),
            _ => Err(ConfigurationError::MissingBucket {
                storage_id: self.storage_id.clone(),
            }),
        }
    }

    /// Compile this storage's cache policy.
    ///
    /// # Errors
    /// Returns error if the rule table is invalid.
    pub fn policy_resolver(&self) -> Result<PolicyResolver, ConfigurationError> {
        PolicyResolver::from_config(&self.cache_policy).map_err(|source| {
            ConfigurationError::InvalidPolicy {
                storage_id: self.storage_id.clone(),
                source,
            }
        })
    }
}

/// Client-level settings for building an S3 client.
#[derive(Debug, Clone, Default)]
pub struct StorageSettings {
    /// AWS region; the SDK default chain decides when absent.
    pub region: Option<String>,
    /// Endpoint URL for S3-compatible stores.
    pub endpoint: Option<String>,
    /// Use path-style addressing.
    pub force_path_style: bool,
    /// AWS credentials (access key, secret key, session token).
    pub credentials: Option<AwsCredentials>,
    /// Expected bucket owner for security validation.
    pub expected_bucket_owner: Option<String>,
    /// Upper bound on one store call, retries included; unbounded when absent.
    pub operation_timeout: Option<Duration>,
}

impl From<&StorageConfig> for StorageSettings {
    fn from(config: &StorageConfig) -> Self {
        let timeout_secs: u64 = config
            .operation_timeout_secs
            .unwrap_or(DEFAULT_OPERATION_TIMEOUT_SECS);
        Self {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
            force_path_style: config.force_path_style,
            credentials: config.credentials.clone(),
            expected_bucket_owner: config.expected_bucket_owner.clone(),
            operation_timeout: Some(Duration::from_secs(timeout_secs)),
        }
    }
}

/// Canonical key of an object within its bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteObjectKey(pub(crate) String);

impl RemoteObjectKey {
    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RemoteObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote object metadata as observed by a HEAD request.
///
/// Fetched fresh for every reconciliation; the store is the source of truth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteObjectSnapshot {
    /// Current `Cache-Control` header.
    pub cache_control: Option<String>,
    /// Current `Content-Type` header.
    pub content_type: Option<String>,
    /// Current `Content-Encoding` header.
    pub content_encoding: Option<String>,
    /// Current `Content-Disposition` header.
    pub content_disposition: Option<String>,
    /// Current `Content-Language` header.
    pub content_language: Option<String>,
    /// `Expires` header, as the raw HTTP date.
    pub expires: Option<String>,
    /// Website redirect target.
    pub website_redirect_location: Option<String>,
    /// Storage class; absent means the store's default.
    pub storage_class: Option<String>,
    /// Server-side encryption algorithm (`AES256`, `aws:kms`, ...).
    pub server_side_encryption: Option<String>,
    /// KMS key used for `aws:kms` encryption.
    pub ssekms_key_id: Option<String>,
    /// Whether an S3 Bucket Key is used for KMS encryption.
    pub bucket_key_enabled: Option<bool>,
    /// User metadata (`x-amz-meta-*`).
    pub metadata: HashMap<String, String>,
    /// Last modified timestamp (Unix epoch seconds).
    pub last_modified: Option<i64>,
}

/// Full metadata set written by a metadata-replacing copy.
///
/// The store drops anything not re-specified, so every header observed on the
/// source is carried over verbatim and only `cache_control` changes. System
/// metadata (storage class, encryption) is reset by a copy too and is carried
/// over the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataReplacement {
    pub cache_control: String,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub content_language: Option<String>,
    pub expires: Option<String>,
    pub website_redirect_location: Option<String>,
    pub storage_class: Option<String>,
    pub server_side_encryption: Option<String>,
    pub ssekms_key_id: Option<String>,
    pub bucket_key_enabled: Option<bool>,
    pub metadata: HashMap<String, String>,
}

impl MetadataReplacement {
    /// Replacement that keeps everything from `snapshot` but the cache directive.
    pub fn from_snapshot(snapshot: &RemoteObjectSnapshot, cache_control: impl Into<String>) -> Self {
        Self {
            cache_control: cache_control.into(),
            content_type: snapshot.content_type.clone(),
            content_encoding: snapshot.content_encoding.clone(),
            content_disposition: snapshot.content_disposition.clone(),
            content_language: snapshot.content_language.clone(),
            expires: snapshot.expires.clone(),
            website_redirect_location: snapshot.website_redirect_location.clone(),
            storage_class: snapshot.storage_class.clone(),
            server_side_encryption: snapshot.server_side_encryption.clone(),
            ssekms_key_id: snapshot.ssekms_key_id.clone(),
            bucket_key_enabled: snapshot.bucket_key_enabled,
            metadata: snapshot.metadata.clone(),
        }
    }
}

/// Why a reconciliation left the object alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Object does not exist (yet).
    NotFound,
    /// Policy has no directive for this file.
    NoPolicy,
    /// Object already carries the desired directive.
    AlreadyCurrent,
    /// Remote object was not modified within the freshness window.
    StaleEvent,
    /// Storage is not served by the object-store driver.
    UnsupportedDriver,
    /// Store call failed.
    StoreError(StorageError),
    /// Storage configuration is missing or invalid.
    ConfigurationError(ConfigurationError),
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileResult {
    /// Metadata was replaced.
    Reconciled {
        previous: Option<String>,
        new: String,
    },
    /// Nothing was written.
    Skipped(SkipReason),
}

impl ReconcileResult {
    /// Whether the object was rewritten.
    pub fn is_reconciled(&self) -> bool {
        matches!(self, ReconcileResult::Reconciled { .. })
    }

    /// Skip reason, if skipped.
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            ReconcileResult::Skipped(reason) => Some(reason),
            ReconcileResult::Reconciled { .. } => None,
        }
    }
}

/// Result for one file of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Identifier of the reconciled file.
    pub identifier: String,
    /// What happened.
    pub result: ReconcileResult,
}

/// Aggregated counts for batch operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStatistics {
    pub reconciled: u64,
    pub already_current: u64,
    pub not_found: u64,
    pub no_policy: u64,
    pub stale_events: u64,
    pub unsupported_driver: u64,
    pub store_errors: u64,
    pub configuration_errors: u64,
}

impl ReconcileStatistics {
    /// Count one result.
    pub fn record(&mut self, result: &ReconcileResult) {
        match result {
            ReconcileResult::Reconciled { .. } => self.reconciled += 1,
            ReconcileResult::Skipped(reason) => match reason {
                SkipReason::NotFound => self.not_found += 1,
                SkipReason::NoPolicy => self.no_policy += 1,
                SkipReason::AlreadyCurrent => self.already_current += 1,
                SkipReason::StaleEvent => self.stale_events += 1,
                SkipReason::UnsupportedDriver => self.unsupported_driver += 1,
                SkipReason::StoreError(_) => self.store_errors += 1,
                SkipReason::ConfigurationError(_) => self.configuration_errors += 1,
            },
        }
    }

    /// Statistics for a set of outcomes.
    pub fn from_outcomes(outcomes: &[ReconcileOutcome]) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            stats.record(&outcome.result);
        }
        stats
    }

    /// Total results counted.
    pub fn total(&self) -> u64 {
        self.reconciled
            + self.already_current
            + self.not_found
            + self.no_policy
            + self.stale_events
            + self.unsupported_driver
            + self.store_errors
            + self.configuration_errors
    }

    /// Results that indicate a failure worth alerting on.
    pub fn failures(&self) -> u64 {
        self.store_errors + self.configuration_errors
    }

    /// Merge another statistics into this one.
    pub fn merge(&mut self, other: Self) {
        self.reconciled += other.reconciled;
        self.already_current += other.already_current;
        self.not_found += other.not_found;
        self.no_policy += other.no_policy;
        self.stale_events += other.stale_events;
        self.unsupported_driver += other.unsupported_driver;
        self.store_errors += other.store_errors;
        self.configuration_errors += other.configuration_errors;
    }
}
