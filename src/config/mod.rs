use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default origin of the MedIQ researcher service.
pub const DEFAULT_API_URL: &str = "http://localhost:8003";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Get the platform config directory for mediq-eda
pub fn get_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "mediq", "mediq-eda")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// Get the platform data directory for mediq-eda (credentials live here)
pub fn get_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "mediq", "mediq-eda")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// Client configuration for the researcher service API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the researcher service
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Override for the persisted credentials file
    pub credentials_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            credentials_path: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from `config.toml` in the platform config
    /// directory, falling back to defaults, then apply environment
    /// variable overrides.
    pub fn load() -> Result<Self> {
        let mut config = match get_config_dir() {
            Ok(dir) => {
                let path = dir.join("config.toml");
                if path.exists() {
                    let contents = std::fs::read_to_string(&path)?;
                    toml::from_str(&contents)?
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        };
        config.merge_env_vars();
        Ok(config)
    }

    /// Apply `MEDIQ_*` environment variable overrides
    pub fn merge_env_vars(&mut self) {
        if let Ok(url) = std::env::var("MEDIQ_API_URL") {
            self.base_url = url;
        }

        if let Ok(timeout) = std::env::var("MEDIQ_TIMEOUT_SECS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.timeout_secs = value;
            }
        }

        if let Ok(path) = std::env::var("MEDIQ_CREDENTIALS") {
            self.credentials_path = Some(PathBuf::from(path));
        }
    }

    /// Resolve the credentials file path, defaulting to the platform
    /// data directory.
    pub fn credentials_path(&self) -> Result<PathBuf> {
        match &self.credentials_path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_data_dir()?.join("credentials.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.credentials_path.is_none());
    }

    #[test]
    fn test_merge_env_vars() {
        let mut config = ApiConfig::default();

        std::env::set_var("MEDIQ_API_URL", "https://api.mediq.example");
        std::env::set_var("MEDIQ_TIMEOUT_SECS", "5");
        std::env::set_var("MEDIQ_CREDENTIALS", "/tmp/creds.json");

        config.merge_env_vars();

        assert_eq!(config.base_url, "https://api.mediq.example");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(
            config.credentials_path,
            Some(PathBuf::from("/tmp/creds.json"))
        );

        // An unparseable timeout leaves the previous value in place
        std::env::set_var("MEDIQ_TIMEOUT_SECS", "not-a-number");
        config.merge_env_vars();
        assert_eq!(config.timeout_secs, 5);

        std::env::remove_var("MEDIQ_API_URL");
        std::env::remove_var("MEDIQ_TIMEOUT_SECS");
        std::env::remove_var("MEDIQ_CREDENTIALS");
    }

    #[test]
    fn test_explicit_credentials_path_wins() {
        let config = ApiConfig {
            credentials_path: Some(PathBuf::from("/tmp/override.json")),
            ..Default::default()
        };
        assert_eq!(
            config.credentials_path().unwrap(),
            PathBuf::from("/tmp/override.json")
        );
    }
}
