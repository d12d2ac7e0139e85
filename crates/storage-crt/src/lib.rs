//! AWS SDK S3 backend for rusty-cache-control.
//!
//! This crate provides a `StorageClient` implementation using the AWS SDK for Rust.
//! It supports the two S3 operations reconciliation needs: `HeadObject` and a
//! metadata-replacing `CopyObject` of an object onto itself.
//!
//! # Example
//!
//! ```ignore
//! use rusty_cache_control_storage_crt::CrtStorageClient;
//! use rusty_cache_control_storage::{CacheControlHooks, StaticStorageConfigs};
//!
//! let configs = StaticStorageConfigs::from_json_file("storages.json")?;
//! let client = CrtStorageClient::for_storage(&configs.config_for("1")?).await?;
//!
//! let hooks = CacheControlHooks::new(&client, &configs, &registry);
//! hooks.on_metadata_record_changed("/images/logo.png").await;
//! ```

mod client;
mod error;

pub use client::{encode_key, CrtStorageClient};
pub use error::CrtError;
