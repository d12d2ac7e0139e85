//! Remote object key resolution.

use rusty_cache_control_common::join_key;

use crate::error::ConfigurationError;
use crate::types::{RemoteObjectKey, StorageConfig};

/// Maps file identifiers to object keys.
///
/// `key = (base_path ? trim(base_path) + "/" : "") + trim(identifier)`.
/// The same (configuration, identifier) pair always yields the same key,
/// whatever separators surround the identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteKeyResolver;

impl RemoteKeyResolver {
    /// Resolve the object key for an identifier.
    ///
    /// # Arguments
    /// * `config` - Storage configuration (bucket and base path)
    /// * `identifier` - File identifier, leading slash optional
    ///
    /// # Errors
    /// Returns error if the storage has no bucket or the identifier does not
    /// name an object.
    pub fn resolve(
        config: &StorageConfig,
        identifier: &str,
    ) -> Result<RemoteObjectKey, ConfigurationError> {
        config.require_bucket()?;
        let key: String = join_key(config.base_path.as_deref(), identifier)?;
        Ok(RemoteObjectKey(key))
    }
}
