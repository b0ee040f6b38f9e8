use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::storage::FileStore;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:10000/chat";
pub const ENDPOINT_ENV: &str = "PAPO_ENDPOINT";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    pub storage_path: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", config_path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Apply the endpoint environment override, if set and non-empty
    pub fn with_env(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                self.endpoint = Some(endpoint);
            }
        }
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|&s| s > 0).map(Duration::from_secs)
    }

    pub fn storage_path(&self) -> Result<PathBuf> {
        match &self.storage_path {
            Some(path) => Ok(path.clone()),
            None => Ok(FileStore::default_path()?),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("papo").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("papo").join("config.json");
        let config = Config {
            endpoint: Some("http://example.test/chat".into()),
            timeout_secs: Some(15),
            storage_path: Some(dir.path().join("storage.json")),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = Config {
            timeout_secs: Some(0),
            ..Config::new()
        };
        assert_eq!(config.timeout(), None);
    }

    // Env mutation stays in this one test so parallel tests never see it
    #[test]
    fn test_env_endpoint_overrides_file_unless_blank() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let file = Config {
            endpoint: Some("http://file.test/chat".into()),
            ..Config::new()
        };
        file.save_to(&path).unwrap();

        std::env::set_var(ENDPOINT_ENV, "http://env.test/chat");
        let overridden = Config::load_from(&path).unwrap().with_env();
        std::env::set_var(ENDPOINT_ENV, "   ");
        let blank = Config::load_from(&path).unwrap().with_env();
        std::env::remove_var(ENDPOINT_ENV);
        let unset = Config::load_from(&path).unwrap().with_env();

        assert_eq!(overridden.endpoint(), "http://env.test/chat");
        assert_eq!(blank.endpoint(), "http://file.test/chat");
        assert_eq!(unset.endpoint(), "http://file.test/chat");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ endpoint: ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
