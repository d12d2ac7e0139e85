//! Cache-Control reconciliation for objects in S3-compatible buckets.
//!
//! This crate keeps the `Cache-Control` header of stored objects in line with
//! a per-storage policy. It works with any [`StorageClient`] implementation:
//!
//! - **CRT Backend** - `rusty-cache-control-storage-crt`, using the AWS SDK for Rust
//! - **Test doubles** - in-memory clients implementing the same trait
//!
//! # Components
//!
//! - [`RemoteKeyResolver`] - maps file identifiers to object keys
//! - [`ObjectReconciler`] - HEAD, compare, metadata-replacing COPY
//! - [`CacheControlHooks`] - notification handlers with derivative fan-out
//!
//! Policy itself comes from `rusty-cache-control-policy`.

mod config;
mod error;
mod hooks;
mod key;
mod reconcile;
mod traits;
mod types;

pub use config::StaticStorageConfigs;
pub use error::{ConfigurationError, ReconcileError, RegistryError, StorageError};
pub use hooks::{CacheControlHooks, UpsertReport};
pub use key::RemoteKeyResolver;
pub use reconcile::{is_recently_modified, ObjectReconciler, ReconcileOptions};
pub use traits::{FileRegistry, StorageClient, StorageConfigProvider};
pub use types::{
    AwsCredentials, FileRef, MetadataReplacement, ReconcileOutcome, ReconcileResult,
    ReconcileStatistics, RemoteObjectKey, RemoteObjectSnapshot, SkipReason, StorageConfig,
    StorageSettings,
};
