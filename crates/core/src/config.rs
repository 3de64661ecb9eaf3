//! Configuration management
//!
//! This module handles loading, generating and deleting the folder-sync
//! configuration file. The file is stored in TOML format at
//! ~/.config/folder-sync/config.toml unless `FS3_CONFIG_DIR` points elsewhere.
//!
//! The configuration is read once per invocation and is immutable afterwards.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::strategy::{
    DEFAULT_LARGE_FILE_THRESHOLD, DEFAULT_MAX_CONCURRENT_PARTS, DEFAULT_PART_SIZE,
};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "FS3_CONFIG_DIR";

/// Key prefix every synced object lives under
pub const DEFAULT_SYNC_FOLDER: &str = "sync/";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Target bucket
    #[serde(default)]
    pub bucket_name: String,

    /// Region the bucket lives in
    #[serde(default)]
    pub bucket_region: String,

    /// Prefix prepended to every synced object key
    #[serde(default = "default_sync_folder")]
    pub bucket_sync_folder: String,

    /// Static access key; falls back to the default AWS chain when empty
    #[serde(default)]
    pub aws_access_key_id: String,

    /// Static secret key; falls back to the default AWS chain when empty
    #[serde(default)]
    pub aws_secret_access_key: String,

    /// Custom endpoint for S3-compatible services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Transfer tuning
    #[serde(default)]
    pub transfer: TransferSettings,
}

/// Transfer tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Files above this many bytes use the streamed strategy
    #[serde(default = "default_threshold")]
    pub large_file_threshold: u64,

    /// Part size for streamed uploads
    #[serde(default = "default_part_size")]
    pub part_size: u64,

    /// Parts in flight per streamed upload
    #[serde(default = "default_max_concurrent_parts")]
    pub max_concurrent_parts: usize,

    /// Files transferred at once in a batch; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_sync_folder() -> String {
    DEFAULT_SYNC_FOLDER.to_string()
}

fn default_threshold() -> u64 {
    DEFAULT_LARGE_FILE_THRESHOLD
}

fn default_part_size() -> u64 {
    DEFAULT_PART_SIZE
}

fn default_max_concurrent_parts() -> usize {
    DEFAULT_MAX_CONCURRENT_PARTS
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            large_file_threshold: default_threshold(),
            part_size: default_part_size(),
            max_concurrent_parts: default_max_concurrent_parts(),
            max_concurrency: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            bucket_name: String::new(),
            bucket_region: String::new(),
            bucket_sync_folder: default_sync_folder(),
            aws_access_key_id: String::new(),
            aws_secret_access_key: String::new(),
            endpoint: None,
            transfer: TransferSettings::default(),
        }
    }
}

impl SyncConfig {
    /// Check that the config can be used to talk to a bucket
    pub fn validate(&self) -> Result<()> {
        if self.bucket_name.trim().is_empty() {
            return Err(Error::Config("bucket_name is not set".into()));
        }
        if self.bucket_region.trim().is_empty() {
            return Err(Error::Config("bucket_region is not set".into()));
        }
        if let Some(endpoint) = &self.endpoint {
            url::Url::parse(endpoint)
                .map_err(|e| Error::Config(format!("Invalid endpoint '{endpoint}': {e}")))?;
        }
        if self.transfer.part_size == 0 || self.transfer.max_concurrent_parts == 0 {
            return Err(Error::Config(
                "part_size and max_concurrent_parts must be positive".into(),
            ));
        }
        if self.transfer.max_concurrency == Some(0) {
            return Err(Error::Config("max_concurrency must be positive".into()));
        }
        Ok(())
    }

    /// Whether static credentials were supplied
    pub fn has_static_credentials(&self) -> bool {
        !self.aws_access_key_id.is_empty() && !self.aws_secret_access_key.is_empty()
    }

    /// The sync prefix, always ending in a single `/` unless empty
    pub fn sync_prefix(&self) -> String {
        let trimmed = self.bucket_sync_folder.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("folder-sync"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Whether a configuration file exists
    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Load configuration from disk
    ///
    /// Unlike most settings files a missing config is an error here: there is
    /// no usable default bucket.
    pub fn load(&self) -> Result<SyncConfig> {
        if !self.exists() {
            return Err(Error::Config(format!(
                "No config found at {}. Run 'fs3 config generate' first.",
                self.config_path.display()
            )));
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: SyncConfig = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade fs3.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &SyncConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Write an empty template for the user to fill in
    pub fn generate(&self) -> Result<()> {
        if self.exists() {
            return Err(Error::Config(format!(
                "A config already exists at {}. Try 'fs3 config delete' first.",
                self.config_path.display()
            )));
        }
        self.save(&SyncConfig::default())
    }

    /// Remove the configuration file
    pub fn delete(&self) -> Result<()> {
        if !self.exists() {
            return Err(Error::Config(format!(
                "Config file not found at {}",
                self.config_path.display()
            )));
        }
        std::fs::remove_file(&self.config_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    fn filled_config() -> SyncConfig {
        SyncConfig {
            bucket_name: "my-bucket".into(),
            bucket_region: "eu-west-1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.bucket_sync_folder, "sync/");
        assert_eq!(config.transfer.large_file_threshold, 100_000_000);
        assert_eq!(config.transfer.part_size, 10 * 1024 * 1024);
        assert_eq!(config.transfer.max_concurrent_parts, 5);
        assert!(config.transfer.max_concurrency.is_none());
        assert!(!config.has_static_credentials());
    }

    #[test]
    fn test_load_missing_is_error() {
        let (manager, _temp_dir) = temp_config_manager();
        let err = manager.load().unwrap_err();
        assert!(err.to_string().contains("config generate"));
    }

    #[test]
    fn test_generate_then_load() {
        let (manager, _temp_dir) = temp_config_manager();
        manager.generate().unwrap();
        assert!(manager.exists());

        let loaded = manager.load().unwrap();
        assert!(loaded.bucket_name.is_empty());
        assert!(loaded.validate().is_err());
    }

    #[test]
    fn test_generate_refuses_overwrite() {
        let (manager, _temp_dir) = temp_config_manager();
        manager.generate().unwrap();
        let err = manager.generate().unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();
        let mut config = filled_config();
        config.transfer.max_concurrency = Some(8);

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.bucket_name, "my-bucket");
        assert_eq!(loaded.bucket_region, "eu-west-1");
        assert_eq!(loaded.transfer.max_concurrency, Some(8));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            "bucket_name = \"b\"\nbucket_region = \"us-east-1\"\n",
        )
        .unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.bucket_sync_folder, "sync/");
        assert_eq!(loaded.transfer.large_file_threshold, 100_000_000);
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_delete() {
        let (manager, _temp_dir) = temp_config_manager();
        assert!(manager.delete().is_err());

        manager.generate().unwrap();
        manager.delete().unwrap();
        assert!(!manager.exists());
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!("schema_version = {}\n", SCHEMA_VERSION + 1);
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("newer than supported"));
    }

    #[test]
    fn test_validate_endpoint() {
        let mut config = filled_config();
        config.endpoint = Some("not a url".into());
        assert!(config.validate().is_err());

        config.endpoint = Some("http://localhost:9000".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = filled_config();
        config.transfer.max_concurrency = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sync_prefix_normalized() {
        let mut config = filled_config();
        assert_eq!(config.sync_prefix(), "sync/");

        config.bucket_sync_folder = "/backups//".into();
        assert_eq!(config.sync_prefix(), "backups/");

        config.bucket_sync_folder = String::new();
        assert_eq!(config.sync_prefix(), "");
    }
}
