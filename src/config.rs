use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::completion::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const API_KEY_ENV: &str = "GROQ_API_KEY";
const APP_DIR_NAME: &str = "persona-chat";
const DEFAULT_RESPONSE_DELAY_MS: u64 = 3000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Minimum time a reply waits before it is shown, in milliseconds.
    pub response_delay_ms: u64,
    pub history_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            response_delay_ms: DEFAULT_RESPONSE_DELAY_MS,
            history_path: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// A missing file is the default config; an unreadable or invalid one is an error.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config at {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config JSON at {}", config_path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config at {}", config_path.display()))?;
        Ok(())
    }

    pub fn save_default_model(model: &str) -> Result<()> {
        let mut config = Self::load()?;
        config.model = model.to_string();
        config.save()
    }

    /// API key from the environment first, then the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        Self::pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.clone())
    }

    fn pick_api_key(from_env: Option<String>, from_file: Option<String>) -> Option<String> {
        from_env
            .filter(|k| !k.trim().is_empty())
            .or(from_file)
            .filter(|k| !k.trim().is_empty())
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }

    pub fn resolve_history_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.history_path {
            return Ok(path.clone());
        }
        Ok(Self::data_dir()?.join("history.db"))
    }

    pub fn log_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("logs"))
    }

    fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;

        Ok(data_dir.join(APP_DIR_NAME))
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join(APP_DIR_NAME).join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_wins_over_file() {
        let key = Config::pick_api_key(Some("env-key".into()), Some("file-key".into()));
        assert_eq!(key.as_deref(), Some("env-key"));
    }

    #[test]
    fn test_blank_env_key_falls_back_to_file() {
        let key = Config::pick_api_key(Some("  ".into()), Some("file-key".into()));
        assert_eq!(key.as_deref(), Some("file-key"));
        assert_eq!(Config::pick_api_key(None, None), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"model":"llama-3.1-8b-instant"}"#).unwrap();
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.response_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_explicit_history_path_is_kept() {
        let config = Config {
            history_path: Some(PathBuf::from("/tmp/chat.db")),
            ..Config::new()
        };
        assert_eq!(config.resolve_history_path().unwrap(), PathBuf::from("/tmp/chat.db"));
    }

    #[test]
    fn test_missing_file_is_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config JSON"));
    }

    #[test]
    fn test_saved_model_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            model: "llama-3.1-8b-instant".to_string(),
            response_delay_ms: 0,
            ..Config::new()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
