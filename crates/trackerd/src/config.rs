//! Configuration management for the invite tracker daemon.
//!
//! Handles loading, validation, and the hierarchical `[domains]` table
//! from TOML files. The domain table is kept as raw TOML; the pure schema
//! walk in `invite_tracker::schema` turns it into flat mapping entries.

use invite_tracker::{collect_domain_leaves, DomainEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default ledger data file location
fn default_data_file() -> String {
    "data/invites.json".to_string()
}

/// Default log level
fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tracker settings
    #[serde(default)]
    pub tracker: TrackerSettings,
    /// Notification transport settings
    #[serde(default)]
    pub notifications: NotificationSettings,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Hierarchical domain mapping table; leaves carry `channel_id` and
    /// `owner_id` at arbitrary nesting depth
    #[serde(default)]
    pub domains: toml::Table,
}

/// Core tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// Path of the ledger snapshot file
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

/// Notification transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Credential for the chat backend; empty means notifications stay off
    #[serde(default)]
    pub credential: String,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            credential: String::new(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerSettings::default(),
            notifications: NotificationSettings::default(),
            logging: LoggingSettings::default(),
            domains: toml::Table::new(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at
    /// the specified path and returns the default configuration. The
    /// caller logs the creation; this can run before the logging
    /// subscriber is installed.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            Ok(default_config)
        }
    }

    /// Flattens the `[domains]` table into mapping entries.
    pub fn domain_entries(&self) -> Vec<DomainEntry> {
        collect_domain_leaves(&self.domains)
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.tracker.data_file.trim().is_empty() {
            return Err("Tracker data file path cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.tracker.data_file, "data/invites.json");
        assert!(config.notifications.credential.is_empty());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.domains.is_empty());
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file_creates_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.tracker.data_file, "data/invites.json");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[tracker]
data_file = "/var/lib/tracker/invites.json"

[notifications]
credential = "secret-token"

[logging]
level = "debug"
json_format = true

[domains.danasty.ashesofheaven.co.uk]
channel_id = "1403060253364588604"
owner_id = "184058325246148609"

[domains.katvenly.ashesofheaven.co.uk]
channel_id = "1403060253364588604"
owner_id = "573732145349132288"
"#;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.toml");
        fs::write(&path, toml_content).await.unwrap();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.tracker.data_file, "/var/lib/tracker/invites.json");
        assert_eq!(config.notifications.credential, "secret-token");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);

        let mut entries = config.domain_entries();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "danasty.ashesofheaven.co.uk");
        assert_eq!(entries[0].owner_id, "184058325246148609");
        assert_eq!(entries[1].path, "katvenly.ashesofheaven.co.uk");
    }

    #[tokio::test]
    async fn test_missing_sections_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.toml");
        fs::write(&path, "[logging]\nlevel = \"warn\"\n").await.unwrap();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.tracker.data_file, "data/invites.json");
        assert!(config.notifications.credential.is_empty());
        assert!(config.domain_entries().is_empty());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.logging.level = "chatty".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.tracker.data_file = "   ".to_string();
        assert!(config.validate().is_err());
    }
}
