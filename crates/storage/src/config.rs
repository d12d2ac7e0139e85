//! Storage configuration providers.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::traits::StorageConfigProvider;
use crate::types::StorageConfig;

/// JSON document layout: `{"storages": [ {...}, ... ]}`.
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    storages: Vec<StorageConfig>,
}

/// Fixed set of storage configurations, keyed by storage id.
#[derive(Debug, Clone, Default)]
pub struct StaticStorageConfigs {
    configs: HashMap<String, StorageConfig>,
}

impl StaticStorageConfigs {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider from configurations. Later duplicates win.
    pub fn from_configs(configs: impl IntoIterator<Item = StorageConfig>) -> Self {
        let mut provider = Self::new();
        for config in configs {
            provider.insert(config);
        }
        provider
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    /// Returns error if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Self::parse(json, "<inline>")
    }

    /// Load a JSON configuration document from disk.
    ///
    /// # Arguments
    /// * `path` - Path to the JSON file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path: &Path = path.as_ref();
        let json: String = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&json, &path.display().to_string())
    }

    fn parse(json: &str, origin: &str) -> Result<Self, ConfigurationError> {
        let document: ConfigDocument =
            serde_json::from_str(json).map_err(|e| ConfigurationError::Parse {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        log::debug!(
            "Loaded {} storage configuration(s) from {}",
            document.storages.len(),
            origin
        );
        Ok(Self::from_configs(document.storages))
    }

    /// Add or replace a configuration.
    pub fn insert(&mut self, config: StorageConfig) {
        self.configs.insert(config.storage_id.clone(), config);
    }

    /// Number of configured storages.
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Whether no storage is configured.
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl StorageConfigProvider for StaticStorageConfigs {
    fn config_for(&self, storage_id: &str) -> Result<StorageConfig, ConfigurationError> {
        self.configs
            .get(storage_id)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownStorage {
                storage_id: storage_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_cache_control_common::S3_DRIVER_KEY;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "storages": [
            {
                "storage_id": "1",
                "bucket": "my-bucket",
                "base_path": "cdn-assets",
                "region": "eu-west-1",
                "credentials": {"access_key_id": "AKIA", "secret_access_key": "secret"},
                "cache_policy": {
                    "rules": [{"extensions": ["png"], "directive": "public, max-age=2592000"}]
                }
            },
            {"storage_id": "2", "driver": "Local"}
        ]
    }"#;

    #[test]
    fn test_from_json_str() {
        let provider = StaticStorageConfigs::from_json_str(SAMPLE).unwrap();
        assert_eq!(provider.len(), 2);

        let s3: StorageConfig = provider.config_for("1").unwrap();
        assert_eq!(s3.driver, S3_DRIVER_KEY);
        assert_eq!(s3.bucket.as_deref(), Some("my-bucket"));
        assert_eq!(s3.base_path.as_deref(), Some("cdn-assets"));
        assert_eq!(s3.cache_policy.rules.len(), 1);
        assert!(s3.credentials.is_some());

        let local: StorageConfig = provider.config_for("2").unwrap();
        assert_eq!(local.driver, "Local");
        assert!(local.bucket.is_none());
    }

    #[test]
    fn test_unknown_storage() {
        let provider = StaticStorageConfigs::new();
        assert!(provider.is_empty());
        assert!(matches!(
            provider.config_for("9"),
            Err(ConfigurationError::UnknownStorage { .. })
        ));
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir: TempDir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storages.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let provider = StaticStorageConfigs::from_json_file(&path).unwrap();
        assert_eq!(provider.len(), 2);
    }

    #[test]
    fn test_from_json_file_missing() {
        let temp_dir: TempDir = TempDir::new().unwrap();
        let result = StaticStorageConfigs::from_json_file(temp_dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigurationError::Io { .. })));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            StaticStorageConfigs::from_json_str("{\"storages\": [{}]}"),
            Err(ConfigurationError::Parse { .. })
        ));
    }
}
