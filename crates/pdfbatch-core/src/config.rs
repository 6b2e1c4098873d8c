use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::job::Quality;

/// Retry policy for artifact fetches (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per artifact (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.25,
            max_delay_secs: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/pdfbatch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Base URL of the processing API; relative artifact locators resolve against it.
    pub api_base_url: String,
    /// Path of the compress endpoint, joined onto `api_base_url`.
    pub endpoint: String,
    /// HTTP status the API reserves for quota / balance exhaustion.
    pub quota_status: u32,
    /// Maximum jobs in flight under the parallel policy.
    pub max_parallel: usize,
    /// Quality code sent with every job unless overridden.
    pub default_quality: Quality,
    /// Connect timeout for uploads and artifact fetches.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout for one upload (upload + server-side processing).
    pub request_timeout_secs: u64,
    /// Optional API key, sent as `x-api-key`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Optional retry policy for artifact fetches; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            endpoint: "/api/pdf/compress".to_string(),
            quota_status: 402,
            max_parallel: 8,
            default_quality: Quality::Medium,
            connect_timeout_secs: 15,
            request_timeout_secs: 300,
            api_key: None,
            retry: None,
        }
    }
}

impl BatchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pdfbatch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: BatchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
