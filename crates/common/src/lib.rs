//! Shared types and utilities for rusty-cache-control.
//!
//! This crate provides common functionality used across all rusty-cache-control crates:
//! - Object key path helpers
//! - Shared constants and error types

pub mod constants;
pub mod error;
pub mod path_utils;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::KeyError;
pub use path_utils::{extension_of, join_key, trim_separators};
