//! Shared constants used across rusty-cache-control crates.

/// Driver key of storages backed by an S3-compatible object store.
///
/// Only files on storages configured with this driver are reconciled.
pub const S3_DRIVER_KEY: &str = "AmazonS3";

/// Default freshness window for post-processing events (seconds).
///
/// A derivative whose remote object was modified longer ago than this is
/// treated as a stale event and left alone.
pub const DEFAULT_FRESHNESS_WINDOW_SECS: u64 = 30;

/// Default number of reconciliations in flight during a derivative fan-out.
pub const DEFAULT_RECONCILE_CONCURRENCY: usize = 8;

/// Default timeout for a single store call, retries included (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Path separator used in object keys.
pub const KEY_SEPARATOR: char = '/';
