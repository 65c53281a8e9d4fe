//! Repository factory for dependency injection.
//!
//! This module provides utilities for creating and configuring repository instances
//! based on runtime configuration.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
#[cfg(feature = "local-repo")]
use super::repositories::LocalRepository;
#[cfg(feature = "rest-repo")]
use super::repositories::RestRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use super::RestConfig;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Hosted backend over HTTP
    Rest,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string.
    ///
    /// # Arguments
    /// * `s` - String representation ("rest", "remote", "local")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rest" | "remote" => Ok(Self::Rest),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from environment variable.
    ///
    /// Reads `REPOSITORY_TYPE`. Defaults to Rest if `BACKEND_URL` is present,
    /// otherwise Local.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var("BACKEND_URL").is_ok() {
            Self::Rest
        } else {
            Self::Local
        }
    }
}

#[cfg_attr(all(feature = "local-repo", feature = "rest-repo"), allow(dead_code))]
fn feature_disabled(name: &str) -> RepositoryError {
    RepositoryError::configuration(format!("{} repository feature not enabled", name))
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use brokerdesk::db::{RepositoryFactory, RepositoryType, RestConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = RestConfig::from_env()?;
///     let _remote = RepositoryFactory::create(RepositoryType::Rest, Some(&config))?;
///
///     let local = RepositoryFactory::create_local();
///     Ok(())
/// }
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// # Arguments
    /// * `repo_type` - Type of repository to create
    /// * `rest_config` - Backend configuration (required for Rest)
    ///
    /// # Returns
    /// * `Ok(Arc<dyn FullRepository>)` - Shared repository instance
    /// * `Err(RepositoryError)` - If the type is unavailable or misconfigured
    pub fn create(
        repo_type: RepositoryType,
        rest_config: Option<&RestConfig>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Rest => {
                #[cfg(feature = "rest-repo")]
                {
                    let config = rest_config.ok_or_else(|| {
                        RepositoryError::configuration("Rest repository requires RestConfig")
                    })?;
                    let repo = Self::create_rest(config)?;
                    Ok(repo as Arc<dyn FullRepository>)
                }
                #[cfg(not(feature = "rest-repo"))]
                {
                    let _ = rest_config;
                    Err(feature_disabled("Rest"))
                }
            }
            RepositoryType::Local => Self::try_create_local(),
        }
    }

    /// Create a repository for the hosted backend.
    #[cfg(feature = "rest-repo")]
    pub fn create_rest(config: &RestConfig) -> RepositoryResult<Arc<RestRepository>> {
        Ok(Arc::new(RestRepository::new(config.clone())?))
    }

    /// Create an in-memory local repository.
    #[cfg(feature = "local-repo")]
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    fn try_create_local() -> RepositoryResult<Arc<dyn FullRepository>> {
        #[cfg(feature = "local-repo")]
        {
            Ok(Self::create_local())
        }
        #[cfg(not(feature = "local-repo"))]
        {
            Err(feature_disabled("Local"))
        }
    }

    /// Create repository from environment configuration.
    ///
    /// Reads `REPOSITORY_TYPE` (see [`RepositoryType::from_env`]) and, for the
    /// hosted backend, the `BACKEND_*` variables.
    pub fn from_env() -> RepositoryResult<Arc<dyn FullRepository>> {
        match RepositoryType::from_env() {
            RepositoryType::Rest => {
                #[cfg(feature = "rest-repo")]
                {
                    let config = RestConfig::from_env().map_err(RepositoryError::configuration)?;
                    Ok(Self::create_rest(&config)? as Arc<dyn FullRepository>)
                }
                #[cfg(not(feature = "rest-repo"))]
                {
                    Err(feature_disabled("Rest"))
                }
            }
            RepositoryType::Local => Self::try_create_local(),
        }
    }

    /// Create repository from a TOML configuration file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the repository.toml configuration file
    pub fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config)
    }

    /// Create repository from the default configuration file location.
    ///
    /// Searches for `repository.toml` in standard locations.
    pub fn from_default_config() -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_default_location()?;
        Self::from_repository_config(&config)
    }

    fn from_repository_config(config: &RepositoryConfig) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        let rest_config = config.to_rest_config()?;
        Self::create(repo_type, rest_config.as_ref())
    }
}

/// Builder for configuring repository creation.
///
/// # Example
/// ```ignore
/// use brokerdesk::db::{RepositoryBuilder, RepositoryType};
///
/// let repo = RepositoryBuilder::new()
///     .repository_type(RepositoryType::Local)
///     .build()?;
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    rest_config: Option<RestConfig>,
}

impl RepositoryBuilder {
    /// Create a new repository builder; the type comes from the environment.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::from_env(),
            rest_config: None,
        }
    }

    /// Set the repository type.
    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    /// Set the backend configuration.
    pub fn rest_config(mut self, config: RestConfig) -> Self {
        self.rest_config = Some(config);
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Result<Self, RepositoryError> {
        self.repo_type = RepositoryType::from_env();
        if self.repo_type == RepositoryType::Rest {
            #[cfg(feature = "rest-repo")]
            {
                self.rest_config =
                    Some(RestConfig::from_env().map_err(RepositoryError::configuration)?);
            }
            #[cfg(not(feature = "rest-repo"))]
            {
                return Err(feature_disabled("Rest"));
            }
        }
        Ok(self)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the repository.toml configuration file
    pub fn from_config_file<P: AsRef<Path>>(
        self,
        config_path: P,
    ) -> Result<Self, RepositoryError> {
        self.with_config(RepositoryConfig::from_file(config_path)?)
    }

    /// Load configuration from default location.
    pub fn from_default_config(self) -> Result<Self, RepositoryError> {
        self.with_config(RepositoryConfig::from_default_location()?)
    }

    fn with_config(mut self, config: RepositoryConfig) -> Result<Self, RepositoryError> {
        self.repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        self.rest_config = config.to_rest_config()?;
        Ok(self)
    }

    /// Build the repository instance.
    pub fn build(self) -> RepositoryResult<Arc<dyn FullRepository>> {
        RepositoryFactory::create(self.repo_type, self.rest_config.as_ref())
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
