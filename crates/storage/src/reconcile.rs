//! Cache-Control reconciliation for remote objects.
//!
//! This module compares the `Cache-Control` header an object currently carries
//! against the directive its storage's policy asks for, and rewrites the
//! object's metadata in place when they differ:
//!
//! 1. Resolve the storage configuration and object key
//! 2. HEAD the object; absent objects are skipped
//! 3. Resolve the desired directive; "no directive" is skipped
//! 4. Equal directives are skipped, so repeated calls never write twice
//! 5. Otherwise copy the object onto itself with `MetadataDirective=REPLACE`,
//!    re-specifying every header observed by the HEAD
//!
//! Reconciliation is best-effort. It runs inside someone else's event
//! pipeline, so no error escapes: store and configuration failures are
//! logged and reported as [`SkipReason`] variants.
//!
//! # Example
//!
//! ```ignore
//! use rusty_cache_control_storage::{FileRef, ObjectReconciler};
//!
//! let reconciler = ObjectReconciler::new(&client, &configs);
//! let result = reconciler.reconcile(&FileRef::original("/images/logo.png", "1")).await;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use rusty_cache_control_common::{
    DEFAULT_FRESHNESS_WINDOW_SECS, DEFAULT_RECONCILE_CONCURRENCY, S3_DRIVER_KEY,
};
use rusty_cache_control_policy::{CachePolicy, PolicyResolver};

use crate::error::{ConfigurationError, ReconcileError};
use crate::key::RemoteKeyResolver;
use crate::traits::{StorageClient, StorageConfigProvider};
use crate::types::{
    FileRef, MetadataReplacement, ReconcileOutcome, ReconcileResult, RemoteObjectKey,
    RemoteObjectSnapshot, SkipReason, StorageConfig,
};

/// Options for reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// How recently a derivative must have changed remotely for a
    /// post-processing event to be acted upon.
    pub freshness_window: Duration,
    /// Maximum reconciliations in flight during a fan-out.
    pub max_concurrency: usize,
    /// Driver key of storages that are reconciled.
    pub driver_key: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(DEFAULT_FRESHNESS_WINDOW_SECS),
            max_concurrency: DEFAULT_RECONCILE_CONCURRENCY,
            driver_key: S3_DRIVER_KEY.to_string(),
        }
    }
}

impl ReconcileOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the freshness window for post-processing events.
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Set maximum concurrency for fan-outs.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set the driver key of reconciled storages.
    pub fn with_driver_key(mut self, driver_key: impl Into<String>) -> Self {
        self.driver_key = driver_key.into();
        self
    }
}

/// Check whether a remote modification falls within the freshness window.
///
/// Modification times ahead of `now` (clock skew) count as recent.
///
/// # Arguments
/// * `remote_mtime` - Remote modification time (Unix epoch seconds)
/// * `now` - Current time (Unix epoch seconds)
/// * `window` - Freshness window
pub fn is_recently_modified(remote_mtime: i64, now: i64, window: Duration) -> bool {
    let window_secs: i64 = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
    now.saturating_sub(remote_mtime) <= window_secs
}

/// Reconciles remote Cache-Control headers using any StorageClient implementation.
pub struct ObjectReconciler<'a, C: StorageClient, P: StorageConfigProvider> {
    /// The storage client for S3 operations.
    client: &'a C,
    /// Storage configuration lookup.
    configs: &'a P,
    /// Reconciliation options.
    options: ReconcileOptions,
}

impl<'a, C: StorageClient, P: StorageConfigProvider> ObjectReconciler<'a, C, P> {
    /// Create a new reconciler.
    ///
    /// # Arguments
    /// * `client` - Storage client for S3 operations
    /// * `configs` - Storage configuration provider
    pub fn new(client: &'a C, configs: &'a P) -> Self {
        Self {
            client,
            configs,
            options: ReconcileOptions::default(),
        }
    }

    /// Set reconciliation options.
    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Bring one object's Cache-Control header in line with policy.
    ///
    /// Never fails; every outcome is a [`ReconcileResult`].
    ///
    /// # Arguments
    /// * `file` - File whose object is reconciled
    pub async fn reconcile(&self, file: &FileRef) -> ReconcileResult {
        let storage: Result<Option<PreparedStorage>, ConfigurationError> =
            self.prepare(&file.storage_id);
        if let Err(err) = &storage {
            log::warn!(
                "Cache-Control update skipped for {}:{}: {}",
                file.storage_id,
                file.identifier,
                err
            );
        }
        self.reconcile_prepared(file, &storage).await
    }

    /// Reconcile only if the remote object changed within `window`.
    ///
    /// Stale events return [`SkipReason::StaleEvent`] without any remote call.
    ///
    /// # Arguments
    /// * `file` - File whose object is reconciled
    /// * `remote_mtime` - Remote modification time (Unix epoch seconds)
    /// * `now` - Current time (Unix epoch seconds)
    /// * `window` - Freshness window
    pub async fn reconcile_if_recently_modified(
        &self,
        file: &FileRef,
        remote_mtime: i64,
        now: i64,
        window: Duration,
    ) -> ReconcileResult {
        if !is_recently_modified(remote_mtime, now, window) {
            log::debug!(
                "Ignoring stale event for {}:{} (modified {}s ago)",
                file.storage_id,
                file.identifier,
                now.saturating_sub(remote_mtime)
            );
            return ReconcileResult::Skipped(SkipReason::StaleEvent);
        }
        self.reconcile(file).await
    }

    /// Reconcile many files independently, bounded by `max_concurrency`.
    ///
    /// A failure for one file never prevents the others from being attempted.
    /// Each storage's configuration is looked up and compiled once per call.
    /// Outcomes are returned in completion order.
    ///
    /// # Arguments
    /// * `files` - Files to reconcile
    pub async fn reconcile_all(&self, files: Vec<FileRef>) -> Vec<ReconcileOutcome> {
        if files.is_empty() {
            return Vec::new();
        }

        let mut storages: HashMap<String, Result<Option<PreparedStorage>, ConfigurationError>> =
            HashMap::new();
        for file in &files {
            storages.entry(file.storage_id.clone()).or_insert_with(|| {
                let storage = self.prepare(&file.storage_id);
                if let Err(err) = &storage {
                    log::warn!(
                        "Cache-Control updates skipped for storage {}: {}",
                        file.storage_id,
                        err
                    );
                }
                storage
            });
        }
        let storages = &storages;

        let max_concurrency: usize = self.options.max_concurrency.max(1);

        stream::iter(files)
            .map(|file| async move {
                let result: ReconcileResult = match storages.get(&file.storage_id) {
                    Some(storage) => self.reconcile_prepared(&file, storage).await,
                    None => self.reconcile(&file).await,
                };
                ReconcileOutcome {
                    identifier: file.identifier,
                    result,
                }
            })
            .buffer_unordered(max_concurrency)
            .collect()
            .await
    }

    /// Look up and validate a storage's configuration and compile its policy.
    ///
    /// Returns `None` for storages served by another driver.
    fn prepare(&self, storage_id: &str) -> Result<Option<PreparedStorage>, ConfigurationError> {
        let config: StorageConfig = self.configs.config_for(storage_id)?;
        if config.driver != self.options.driver_key {
            return Ok(None);
        }

        let bucket: String = config.require_bucket()?.to_string();
        let resolver: PolicyResolver = config.policy_resolver()?;
        Ok(Some(PreparedStorage {
            config,
            bucket,
            resolver,
        }))
    }

    /// Reconcile against already-prepared storage state. Configuration errors
    /// are reported, not logged; the caller logged them when preparing.
    async fn reconcile_prepared(
        &self,
        file: &FileRef,
        storage: &Result<Option<PreparedStorage>, ConfigurationError>,
    ) -> ReconcileResult {
        let storage: &PreparedStorage = match storage {
            Ok(Some(storage)) => storage,
            Ok(None) => {
                log::debug!("Skipped {}:{}: unsupported driver", file.storage_id, file.identifier);
                return ReconcileResult::Skipped(SkipReason::UnsupportedDriver);
            }
            Err(err) => return ReconcileResult::Skipped(SkipReason::ConfigurationError(err.clone())),
        };

        match self.try_reconcile(file, storage).await {
            Ok(result) => {
                if let ReconcileResult::Skipped(reason) = &result {
                    log::debug!("Skipped {}:{}: {:?}", file.storage_id, file.identifier, reason);
                }
                result
            }
            Err(ReconcileError::Store(err)) => {
                log::warn!(
                    "Cache-Control update failed for {}:{}: {}",
                    file.storage_id,
                    file.identifier,
                    err
                );
                ReconcileResult::Skipped(SkipReason::StoreError(err))
            }
            Err(ReconcileError::Configuration(err)) => {
                log::warn!(
                    "Cache-Control update skipped for {}:{}: {}",
                    file.storage_id,
                    file.identifier,
                    err
                );
                ReconcileResult::Skipped(SkipReason::ConfigurationError(err))
            }
        }
    }

    async fn try_reconcile(
        &self,
        file: &FileRef,
        storage: &PreparedStorage,
    ) -> Result<ReconcileResult, ReconcileError> {
        let bucket: &str = storage.bucket.as_str();
        let key: RemoteObjectKey = RemoteKeyResolver::resolve(&storage.config, &file.identifier)?;

        let snapshot: RemoteObjectSnapshot = match self
            .client
            .head_object_with_metadata(bucket, key.as_str())
            .await?
        {
            Some(snapshot) => snapshot,
            None => return Ok(ReconcileResult::Skipped(SkipReason::NotFound)),
        };

        let (policy_path, derived) = file.policy_subject();
        let desired: String = match storage.resolver.resolve(policy_path, derived) {
            CachePolicy::Directive(value) => value,
            CachePolicy::NoDirective => return Ok(ReconcileResult::Skipped(SkipReason::NoPolicy)),
        };

        if snapshot.cache_control.as_deref() == Some(desired.as_str()) {
            return Ok(ReconcileResult::Skipped(SkipReason::AlreadyCurrent));
        }

        let replacement: MetadataReplacement = MetadataReplacement::from_snapshot(&snapshot, &desired);
        self.client
            .copy_object_metadata(bucket, key.as_str(), &replacement)
            .await?;

        log::info!(
            "Updated Cache-Control of s3://{}/{} from {:?} to {:?}",
            bucket,
            key,
            snapshot.cache_control,
            desired
        );

        Ok(ReconcileResult::Reconciled {
            previous: snapshot.cache_control,
            new: desired,
        })
    }
}

/// Configuration and compiled policy of one S3 storage.
struct PreparedStorage {
    config: StorageConfig,
    bucket: String,
    resolver: PolicyResolver,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_options_default() {
        let options = ReconcileOptions::default();
        assert_eq!(options.freshness_window, Duration::from_secs(30));
        assert_eq!(options.max_concurrency, DEFAULT_RECONCILE_CONCURRENCY);
        assert_eq!(options.driver_key, S3_DRIVER_KEY);
    }

    #[test]
    fn test_reconcile_options_builders() {
        let options = ReconcileOptions::new()
            .with_freshness_window(Duration::from_secs(5))
            .with_max_concurrency(2)
            .with_driver_key("Minio");
        assert_eq!(options.freshness_window, Duration::from_secs(5));
        assert_eq!(options.max_concurrency, 2);
        assert_eq!(options.driver_key, "Minio");
    }

    #[test]
    fn test_freshness_window_boundaries() {
        let window = Duration::from_secs(30);
        assert!(is_recently_modified(1_000, 1_030, window));
        assert!(!is_recently_modified(1_000, 1_031, window));
        assert!(is_recently_modified(1_000, 1_000, window));
    }

    #[test]
    fn test_future_mtime_counts_as_recent() {
        assert!(is_recently_modified(2_000, 1_000, Duration::from_secs(30)));
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        assert!(is_recently_modified(0, i64::MAX, Duration::from_secs(u64::MAX)));
    }
}
