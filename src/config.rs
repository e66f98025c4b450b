//! Application configuration persisted to `<exe_dir>/config.json`.
//!
//! Holds the service credentials and the last-used session settings. A missing
//! or unreadable file is not an error: defaults are used and the reason logged.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::automation::config::SessionConfig;
use crate::ocr::BaiduCredentials;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaiduKeys {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
}

impl BaiduKeys {
    pub fn credentials(&self) -> BaiduCredentials {
        BaiduCredentials::new(self.api_key.trim(), self.secret_key.trim())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub deepseek_api_key: String,
    /// Credentials for the plain-text endpoint
    #[serde(default)]
    pub baidu_basic: BaiduKeys,
    /// Credentials for the endpoint that returns word positions
    #[serde(default)]
    pub baidu_accurate: BaiduKeys,
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Loads `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            crate::log(&format!(
                "{} not found. Using default config.",
                path.display()
            ));
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log(&format!("Config loaded from {}", path.display()));
                    config
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    ));
                    Self::default()
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read {}: {}. Using defaults.",
                    path.display(),
                    e
                ));
                Self::default()
            }
        }
    }

    pub fn load() -> Self {
        Self::load_from(&crate::paths::get_config_path())
    }

    /// Writes the config as pretty JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&crate::paths::get_config_path())
    }
}

/// Masks a secret for display: first 4 + stars + last 4.
///
/// Keys of up to 4 characters are fully starred; up to 8 keep only the first 4.
pub fn mask_secret(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let len = chars.len();

    if len <= 4 {
        return "*".repeat(len);
    }

    let prefix: String = chars[..4].iter().collect();
    if len <= 8 {
        return format!("{}{}", prefix, "*".repeat(len - 4));
    }

    let suffix: String = chars[len - 4..].iter().collect();
    format!("{}{}{}", prefix, "*".repeat(len - 8), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::config::SessionMode;
    use crate::automation::geometry::{Point, Rect};
    use tempfile::TempDir;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("abcd"), "****");
        assert_eq!(mask_secret("abcdef"), "abcd**");
        assert_eq!(mask_secret("abcdefgh"), "abcd****");
        assert_eq!(mask_secret("sk-1234567890abcd"), "sk-1*********abcd");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig {
            deepseek_api_key: "sk-test".to_string(),
            ..AppConfig::default()
        };
        config.baidu_accurate.api_key = "ak".to_string();
        config.session.region = Rect::new(10, 20, 810, 620);
        config.session.mode = SessionMode::Scroll;
        config.session.next_button = Some(Point::new(700, 550));
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.deepseek_api_key, "sk-test");
        assert_eq!(loaded.baidu_accurate.api_key, "ak");
        assert_eq!(loaded.session.region, Rect::new(10, 20, 810, 620));
        assert_eq!(loaded.session.mode, SessionMode::Scroll);
        assert_eq!(loaded.session.next_button, Some(Point::new(700, 550)));
    }

    #[test]
    fn test_missing_or_invalid_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(AppConfig::load_from(&missing).deepseek_api_key.is_empty());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let config = AppConfig::load_from(&broken);
        assert_eq!(config.session.total_questions, 10);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"deepseek_api_key": "sk-x"}"#).unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.deepseek_api_key, "sk-x");
        assert_eq!(config.session.model, "deepseek-chat");
        assert_eq!(config.session.interval_ms, 3000);
    }

    #[test]
    fn test_credentials_are_trimmed() {
        let keys = BaiduKeys {
            api_key: " ak ".to_string(),
            secret_key: "sk\n".to_string(),
        };
        let credentials = keys.credentials();
        assert_eq!(credentials.api_key, "ak");
        assert_eq!(credentials.secret_key, "sk");
    }
}
