//! Configuration management for the ruleset-sync CLI.
//!
//! The configuration is stored in TOML format and can be loaded from a
//! specified file path or from the default location in the current directory.
//! Every setting is optional; command-line flags override file values.

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use ruleset_sync_core::ConflictPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "ruleset-sync.toml";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Main configuration structure for the ruleset-sync CLI application.
///
/// # Example TOML Configuration
///
/// ```toml
/// [github]
/// api_base_url = "https://github.example.com/api/v3"
/// token_env_var = "ACME_GITHUB_TOKEN"
///
/// [sync]
/// conflict_policy = "replace"
/// max_concurrency = 4
/// transport = "api"
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file does not exist, cannot be read,
    /// contains invalid TOML or holds invalid values.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::path::Path;
    /// use ruleset_sync_cli::config::AppConfig;
    ///
    /// match AppConfig::load(Path::new("./ruleset-sync.toml")) {
    ///     Ok(config) => println!("Conflict policy: {}", config.sync.conflict_policy),
    ///     Err(e) => eprintln!("Failed to load config: {}", e),
    /// }
    /// ```
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration for a command.
    ///
    /// An explicitly named file must exist. When no file is named, the default
    /// file is used if present and built-in defaults otherwise.
    pub fn load_or_default(config_path: Option<&str>) -> Result<Self, Error> {
        let path = get_config_path(config_path);

        if config_path.is_none() && !path.exists() {
            debug!("No configuration file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        Self::load(&path)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.sync.max_concurrency == 0 {
            return Err(Error::Config(
                "sync.max_concurrency must be at least 1".to_string(),
            ));
        }

        if let Some(url) = &self.github.api_base_url {
            if url.trim().is_empty() {
                return Err(Error::Config(
                    "github.api_base_url cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// GitHub connection settings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URL of the REST API, for GitHub Enterprise Server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    /// Extra environment variable checked for a token before the standard ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env_var: Option<String>,
}

/// How the CLI talks to GitHub.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// The REST API, authenticated with a token.
    #[default]
    Api,
    /// The `gh` executable and its stored credential.
    Gh,
}

/// Sync run defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    #[serde(default = "SyncConfig::default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default)]
    pub transport: Transport,
}

impl SyncConfig {
    fn default_max_concurrency() -> usize {
        1
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            max_concurrency: SyncConfig::default_max_concurrency(),
            transport: Transport::default(),
        }
    }
}

/// Resolves the path to the configuration file.
///
/// Returns `config_path` when given, otherwise `./ruleset-sync.toml`.
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILENAME)
    }
}
