//! Configuration for the essentials plugin.
//!
//! Loaded from `essentials.toml`. Every section and field has a default, so
//! an empty file (or none at all) gives a fully enabled plugin storing its
//! data under `data/`.

use crate::error::{EssentialsError, Result};
use crate::storage::WriteMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Log levels accepted by `[logging] level`.
pub const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Longest accepted `[tpa] request_timeout_secs`: one day.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 24 * 60 * 60;

fn default_true() -> bool {
    true
}

fn default_notice_title() -> String {
    "Notice".to_string()
}

fn default_notice_content() -> String {
    "Welcome to the server!".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Top-level plugin configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EssentialsConfig {
    #[serde(default)]
    pub features: FeatureSettings,
    #[serde(default)]
    pub notice: NoticeSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub tpa: TpaSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Feature toggles. A disabled feature's store is never opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSettings {
    /// `/back` to the last death location
    #[serde(default = "default_true")]
    pub back: bool,
    /// `/tpa` teleport requests
    #[serde(default = "default_true")]
    pub tpa: bool,
    #[serde(default = "default_true")]
    pub home: bool,
    #[serde(default = "default_true")]
    pub warp: bool,
    #[serde(default = "default_true")]
    pub hub: bool,
    /// Notice shown to players when they join
    #[serde(default = "default_true")]
    pub notice: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            back: true,
            tpa: true,
            home: true,
            warp: true,
            hub: true,
            notice: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeSettings {
    #[serde(default = "default_notice_title")]
    pub title: String,
    #[serde(default = "default_notice_content")]
    pub content: String,
}

impl Default for NoticeSettings {
    fn default() -> Self {
        Self {
            title: default_notice_title(),
            content: default_notice_content(),
        }
    }
}

/// Where and how the location files are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding `warp.json`, `home.json` and `hub.json`
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub write_mode: WriteMode,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            write_mode: WriteMode::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TpaSettings {
    /// Seconds before an unanswered request lapses; never when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl TpaSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl EssentialsConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration to `path`
    /// and returns it.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| EssentialsError::persistence(path, "failed to read config", e))?;
            let config: EssentialsConfig = toml::from_str(&content).map_err(|e| {
                EssentialsError::Config(format!("{}: {}", path.display(), e))
            })?;
            Ok(config)
        } else {
            let default_config = EssentialsConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)
                .map_err(|e| EssentialsError::Config(e.to_string()))?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    EssentialsError::persistence(parent, "failed to create config directory", e)
                })?;
            }
            fs::write(path, toml_content)
                .map_err(|e| EssentialsError::persistence(path, "failed to write config", e))?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Data directory, resolved against `base` when relative.
    pub fn data_dir(&self, base: &Path) -> PathBuf {
        let dir = Path::new(&self.storage.data_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            base.join(dir)
        }
    }

    /// Checks the configuration for values the plugin cannot run with.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {VALID_LOG_LEVELS:?}",
                &self.logging.level
            ));
        }

        if self.storage.data_dir.trim().is_empty() {
            return Err("Data directory cannot be empty".to_string());
        }

        match self.tpa.request_timeout_secs {
            Some(0) => {
                return Err(
                    "tpa.request_timeout_secs must be greater than 0 (omit it to disable expiry)"
                        .to_string(),
                );
            }
            Some(secs) if secs > MAX_REQUEST_TIMEOUT_SECS => {
                return Err(format!(
                    "tpa.request_timeout_secs must be at most {MAX_REQUEST_TIMEOUT_SECS}, got {secs}"
                ));
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = EssentialsConfig::default();

        assert!(config.features.back);
        assert!(config.features.tpa);
        assert!(config.features.home);
        assert!(config.features.warp);
        assert!(config.features.hub);
        assert!(config.features.notice);

        assert_eq!(config.storage.data_dir, "data");
        assert_eq!(config.storage.write_mode, WriteMode::Atomic);
        assert!(config.tpa.request_timeout().is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_load_from_nonexistent_file_creates_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config").join("essentials.toml");

        let config = EssentialsConfig::load_from_file(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.storage.data_dir, "data");

        let reloaded = EssentialsConfig::load_from_file(&path).unwrap();
        assert_eq!(reloaded.notice.title, config.notice.title);
        assert_eq!(reloaded.storage.write_mode, config.storage.write_mode);
    }

    #[test]
    fn test_load_from_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("essentials.toml");
        fs::write(
            &path,
            r#"
[features]
tpa = false
notice = false

[notice]
title = "Hello"

[storage]
data_dir = "/srv/essentials"
write_mode = "truncate"

[tpa]
request_timeout_secs = 30
"#,
        )
        .unwrap();

        let config = EssentialsConfig::load_from_file(&path).unwrap();
        assert!(!config.features.tpa);
        assert!(!config.features.notice);
        assert!(config.features.home);
        assert_eq!(config.notice.title, "Hello");
        assert_eq!(config.notice.content, "Welcome to the server!");
        assert_eq!(config.storage.write_mode, WriteMode::Truncate);
        assert_eq!(config.tpa.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(
            config.data_dir(Path::new("/ignored")),
            PathBuf::from("/srv/essentials")
        );
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("essentials.toml");
        fs::write(&path, "[storage]\nwrite_mode = \"sometimes\"\n").unwrap();

        let err = EssentialsConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, EssentialsError::Config(_)));
    }

    #[test]
    fn test_relative_data_dir_resolves_against_base() {
        let config = EssentialsConfig::default();
        assert_eq!(
            config.data_dir(Path::new("/plugins/essentials")),
            PathBuf::from("/plugins/essentials/data")
        );
    }

    #[test]
    fn test_validation() {
        assert!(EssentialsConfig::default().validate().is_ok());

        for level in VALID_LOG_LEVELS {
            let mut config = EssentialsConfig::default();
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok());
        }

        let mut config = EssentialsConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().unwrap_err().contains("Invalid log level"));

        let mut config = EssentialsConfig::default();
        config.storage.data_dir = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = EssentialsConfig::default();
        config.tpa.request_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        let mut config = EssentialsConfig::default();
        config.tpa.request_timeout_secs = Some(MAX_REQUEST_TIMEOUT_SECS);
        assert!(config.validate().is_ok());
        config.tpa.request_timeout_secs = Some(MAX_REQUEST_TIMEOUT_SECS + 1);
        assert!(config.validate().is_err());
        config.tpa.request_timeout_secs = Some(u64::MAX);
        assert!(config.validate().unwrap_err().contains("at most"));
    }

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let text = toml::to_string_pretty(&EssentialsConfig::default()).unwrap();
        let config: EssentialsConfig = toml::from_str(&text).unwrap();
        assert!(config.features.warp);
        assert_eq!(config.storage.data_dir, "data");
        assert_eq!(config.logging.level, "info");

        let empty: EssentialsConfig = toml::from_str("").unwrap();
        assert!(empty.features.back);
    }
}
