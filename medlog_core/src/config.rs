//! Configuration file support for Medlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/medlog/config.toml`, or
//! from the path in `MEDLOG_CONFIG` when that variable is set.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that points at an alternative config file
pub const CONFIG_ENV_VAR: &str = "MEDLOG_CONFIG";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub cards: CardsConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Shared PIN that gates edits and deletes
///
/// This is a convenience lock for a shared device, not access control.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_pin")]
    pub pin: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { pin: default_pin() }
    }
}

/// Medicines shown as cards
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardsConfig {
    #[serde(default = "default_card_names")]
    pub names: Vec<String>,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            names: default_card_names(),
        }
    }
}

/// Confirmation behavior when logging a dose
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct RecordingConfig {
    /// Ask for confirmation before a dose is appended
    #[serde(default)]
    pub confirm: bool,

    /// Require the shared PIN to confirm a dose (implies `confirm`)
    #[serde(default)]
    pub require_pin: bool,
}

/// Presentation settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_banner_seconds")]
    pub banner_seconds: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            banner_seconds: default_banner_seconds(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("medlog")
}

fn default_pin() -> String {
    "0000".into()
}

fn default_card_names() -> Vec<String> {
    crate::cards::default_cards()
        .iter()
        .map(|card| card.name.clone())
        .collect()
}

fn default_banner_seconds() -> u32 {
    3
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Load configuration from `MEDLOG_CONFIG` or the standard config path
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("medlog").join("config.toml")
    }

    /// Path of the persisted dose log slot
    pub fn logs_path(&self) -> PathBuf {
        self.data.data_dir.join(crate::store::LOGS_FILE_NAME)
    }

    /// Whether logging a dose goes through the confirmation dialog
    pub fn confirm_recording(&self) -> bool {
        self.recording.confirm || self.recording.require_pin
    }

    /// Reject settings the rest of the system cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.security.pin.is_empty() {
            return Err(Error::Config("security.pin must not be empty".into()));
        }
        // The prompt passes the PIN through untrimmed
        if self.security.pin.trim() != self.security.pin {
            return Err(Error::Config(
                "security.pin must not start or end with whitespace".into(),
            ));
        }
        let errors = crate::cards::CardSet::from_config(&self.cards).validate();
        if !errors.is_empty() {
            return Err(Error::Config(errors.join("; ")));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.security.pin, "0000");
        assert_eq!(config.ui.banner_seconds, 3);
        assert!(config.cards.names.contains(&"Aspirin".to_string()));
        assert!(!config.confirm_recording());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.security.pin = "4321".into();
        config.recording.confirm = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.security.pin, "4321");
        assert!(loaded.recording.confirm);
        assert_eq!(loaded.cards.names, config.cards.names);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[recording]
require_pin = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.recording.require_pin);
        assert!(config.confirm_recording());
        assert_eq!(config.security.pin, "0000"); // default
    }

    #[test]
    fn test_empty_pin_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[security]\npin = \"\"\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_padded_pin_rejected() {
        let toml_str = r#"
[security]
pin = " 12 "
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        match config.validate() {
            Err(Error::Config(message)) => assert!(message.contains("whitespace")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_cards_rejected() {
        let toml_str = r#"
[cards]
names = ["Aspirin", "Aspirin"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }
}
