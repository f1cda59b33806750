use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::module::sky::catalog::CatalogFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Locations of the datasets loaded for every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_ephemeris_path")]
    pub ephemeris_path: PathBuf,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    #[serde(default)]
    pub catalog_format: CatalogFormat,

    #[serde(default = "default_constellation_path")]
    pub constellation_path: PathBuf,

    /// Stars at or above this magnitude are left out
    #[serde(default = "default_magnitude_limit")]
    pub magnitude_limit: f64,
}

/// External summary endpoint used for descriptions and images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8040
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_ephemeris_path() -> PathBuf {
    PathBuf::from("data/de421.bsp")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/hip_main.dat")
}

fn default_constellation_path() -> PathBuf {
    PathBuf::from("data/constellationship.fab")
}

fn default_magnitude_limit() -> f64 {
    2.0
}

fn default_base_url() -> String {
    "https://en.wikipedia.org".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    format!("merai-backend/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            data: DataConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            ephemeris_path: default_ephemeris_path(),
            catalog_path: default_catalog_path(),
            catalog_format: CatalogFormat::default(),
            constellation_path: default_constellation_path(),
            magnitude_limit: default_magnitude_limit(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl BackendConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        let config: BackendConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Load the config file if present, otherwise fall back to defaults
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!("Config file {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
