use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::RetryPolicy;
use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_SEARCH_RADIUS_KM, HTTP_REQUEST_TIMEOUT_SECS, QUERY_RETRIES,
    QUERY_RETRY_BASE_DELAY_MS, QUERY_RETRY_MAX_DELAY_MS, QUERY_STALE_SECS, SEARCH_FRESHNESS_SECS,
    SESSION_STORAGE_KEY,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Instructor search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Read query behaviour
    #[serde(default)]
    pub queries: QueryConfig,

    /// Local persistence
    #[serde(default)]
    pub storage: StorageConfig,
}

/// API server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Instructor search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Radius in km when the caller gives none
    pub default_radius_km: f64,
    /// How long a result stays fresh for the same position
    pub freshness_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_km: DEFAULT_SEARCH_RADIUS_KM,
            freshness_secs: SEARCH_FRESHNESS_SECS,
        }
    }
}

/// Read query behaviour. Mutations are never retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    pub retries: u32,
    pub retry_base_delay_ms: u64,
    /// How long a listing stays fresh
    pub stale_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retries: QUERY_RETRIES,
            retry_base_delay_ms: QUERY_RETRY_BASE_DELAY_MS,
            stale_secs: QUERY_STALE_SECS,
        }
    }
}

impl QueryConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(QUERY_RETRY_MAX_DELAY_MS),
        }
    }
}

/// Local persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for persisted records (defaults to the platform data dir)
    pub dir: Option<PathBuf>,
    /// Record name of the persisted session
    pub session_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            session_key: SESSION_STORAGE_KEY.to_string(),
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let global_config = get_config_dir()?.join("config.toml");
    let local_config = PathBuf::from(".drivebook/config.toml");
    build_figment(&[global_config, local_config])
        .extract()
        .context("Failed to load configuration")
}

/// Load configuration from an explicit file, still honouring the environment
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    build_figment(&[path.to_path_buf()])
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn build_figment(files: &[PathBuf]) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    for file in files {
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }
    }

    // DRIVEBOOK_API__BASE_URL=... overrides api.base_url
    figment.merge(Env::prefixed("DRIVEBOOK_").split("__"))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "drivebook") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("drivebook");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Directory for persisted records when none is configured
pub fn get_data_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "drivebook") {
        Ok(proj_dirs.data_dir().to_path_buf())
    } else {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        Ok(PathBuf::from(home).join(".local").join("share").join("drivebook"))
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist.
/// Returns the path when a file was written.
pub fn init_config() -> Result<Option<PathBuf>> {
    let config_file = get_config_dir()?.join("config.toml");

    if config_file.exists() {
        return Ok(None);
    }
    save_config(&Config::default(), Some(config_file.clone()))?;
    Ok(Some(config_file))
}
