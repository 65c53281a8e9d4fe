//! Repository configuration file support.
//!
//! This module provides utilities for reading repository configuration from
//! TOML configuration files:
//!
//! ```toml
//! [repository]
//! type = "rest"
//!
//! [rest]
//! url = "https://xyz.example.co"
//! anon_key = "public-key"
//! timeout_secs = 15
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::factory::RepositoryType;
use super::repository::RepositoryError;
use crate::db::RestConfig;

/// Repository configuration from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub repository: RepositorySettings,
    #[serde(default)]
    pub rest: RestSettings,
}

/// Repository type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
}

/// Hosted backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RestSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

impl RestSettings {
    /// Overlay `BACKEND_URL`, `BACKEND_ANON_KEY`, `BACKEND_ACCESS_TOKEN` and
    /// `BACKEND_TIMEOUT_SECS` on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("BACKEND_URL") {
            self.url = url;
        }
        if let Ok(key) = std::env::var("BACKEND_ANON_KEY") {
            self.anon_key = key;
        }
        if let Ok(token) = std::env::var("BACKEND_ACCESS_TOKEN") {
            self.access_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(timeout) = std::env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.timeout_secs = timeout;
        }
        self
    }
}

impl RepositoryConfig {
    /// Load repository configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(RepositoryConfig)` if successful
    /// * `Err(RepositoryError)` if file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!("Failed to read config file: {}", e))
        })?;

        let config: RepositoryConfig = toml::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })?;

        Ok(config)
    }

    /// Load repository configuration from the default location.
    ///
    /// Searches for `repository.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = [
            PathBuf::from("repository.toml"),
            PathBuf::from("backend/repository.toml"),
            PathBuf::from("../repository.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::debug!("Loading repository config from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Err(RepositoryError::configuration(
            "No repository.toml found in standard locations",
        ))
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }

    /// Convert to RestConfig if this is a Rest configuration.
    ///
    /// Environment variables take precedence over the file.
    #[cfg(feature = "rest-repo")]
    pub fn to_rest_config(&self) -> Result<Option<RestConfig>, RepositoryError> {
        let repo_type = self.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;

        if repo_type != RepositoryType::Rest {
            return Ok(None);
        }

        let settings = self.rest.clone().with_env_overrides();
        let config = RestConfig {
            url: settings.url,
            anon_key: settings.anon_key,
            access_token: settings.access_token,
            timeout_secs: settings.timeout_secs,
        };
        config.validate().map_err(|e| {
            RepositoryError::configuration(format!("Invalid [rest] settings: {}", e))
        })?;
        Ok(Some(config))
    }

    /// Convert to RestConfig when the feature is disabled.
    #[cfg(not(feature = "rest-repo"))]
    pub fn to_rest_config(&self) -> Result<Option<RestConfig>, RepositoryError> {
        let repo_type = self.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;

        if repo_type == RepositoryType::Rest {
            return Err(RepositoryError::configuration(
                "Rest repository feature not enabled",
            ));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_config() {
        let toml = r#"
[repository]
type = "local"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.repository.repo_type, "local");
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
        assert_eq!(config.rest.timeout_secs, 30);
        assert!(config.to_rest_config().unwrap().is_none());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let config: RepositoryConfig = toml::from_str("[repository]\ntype = \"sqlite\"\n").unwrap();
        assert!(config.repository_type().is_err());
        assert!(config.to_rest_config().is_err());
    }
}
