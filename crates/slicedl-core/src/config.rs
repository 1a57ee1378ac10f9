use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::retry::DEFAULT_MAX_ATTEMPTS;

/// Default per-attempt timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
/// Default number of concurrent segment workers.
pub const DEFAULT_THREADS: usize = 5;
/// Default read/write chunk size (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
/// Largest per-attempt timeout; curl takes timeouts as 32-bit milliseconds on some targets.
pub const MAX_TIMEOUT_SECS: f64 = 2_000_000.0;

fn default_abort_status_codes() -> Vec<u32> {
    vec![403]
}

/// Defaults loaded from `~/.config/slicedl/config.toml`; CLI flags override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicedlConfig {
    /// Per-attempt timeout in seconds.
    pub timeout_secs: f64,
    /// Number of concurrent segment workers.
    pub threads: usize,
    /// Maximum attempts per segment (including the first).
    pub max_attempts: u32,
    /// Response statuses that abort the whole job.
    pub abort_status_codes: Vec<u32>,
    /// Read/write chunk size in bytes.
    pub chunk_size: usize,
    /// User agent to send when no `User-Agent` header is given (None = built-in browser UA).
    pub user_agent: Option<String>,
}

impl Default for SlicedlConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            threads: DEFAULT_THREADS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            abort_status_codes: default_abort_status_codes(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            user_agent: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("slicedl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

impl SlicedlConfig {
    /// Load configuration from disk, creating a default file if none exists.
    pub fn load_or_init() -> Result<SlicedlConfig> {
        let path = config_path()?;
        if !path.exists() {
            let default_cfg = SlicedlConfig::default();
            let toml = toml::to_string_pretty(&default_cfg)?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, toml)?;
            tracing::info!("created default config at {}", path.display());
            return Ok(default_cfg);
        }

        let data = fs::read_to_string(&path)?;
        let cfg: SlicedlConfig = toml::from_str(&data)?;
        Ok(cfg)
    }
}

/// Everything one job needs. Build with `JobConfig::new` or `JobConfig::from_defaults`
/// and adjust the public fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Resource URL.
    pub url: String,
    /// Request headers (names are normalized before use).
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Directory for segment files; wiped at start and removed at the end.
    pub temp_dir: PathBuf,
    /// Final merged file.
    pub output_path: PathBuf,
    pub timeout_secs: f64,
    /// Worker concurrency (values below 1 run one worker).
    pub threads: usize,
    pub max_attempts: u32,
    pub abort_status_codes: Vec<u32>,
    pub chunk_size: usize,
}

/// Invalid job configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported URL scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
    #[error("timeout must be a positive number of seconds up to {max}, got {0}", max = MAX_TIMEOUT_SECS)]
    InvalidTimeout(f64),
    #[error("chunk size must be at least 1 byte")]
    ZeroChunkSize,
}

impl JobConfig {
    /// Job with built-in defaults.
    pub fn new(url: impl Into<String>, temp_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self::from_defaults(&SlicedlConfig::default(), url, temp_dir, output_path)
    }

    /// Job with defaults taken from a loaded config file.
    pub fn from_defaults(
        cfg: &SlicedlConfig,
        url: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        let mut headers = HashMap::new();
        if let Some(ua) = &cfg.user_agent {
            headers.insert("user-agent".to_string(), ua.clone());
        }
        Self {
            url: url.into(),
            headers,
            temp_dir: temp_dir.into(),
            output_path: output_path.into(),
            timeout_secs: cfg.timeout_secs,
            threads: cfg.threads,
            max_attempts: cfg.max_attempts,
            abort_status_codes: cfg.abort_status_codes.clone(),
            chunk_size: cfg.chunk_size,
        }
    }

    /// Per-attempt time budget. Out-of-range values (rejected by `validate`) saturate.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or(Duration::from_secs_f64(MAX_TIMEOUT_SECS))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.url).map_err(|source| ConfigError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
        }
        let representable = Duration::try_from_secs_f64(self.timeout_secs).is_ok();
        if !(representable && self.timeout_secs > 0.0 && self.timeout_secs <= MAX_TIMEOUT_SECS) {
            return Err(ConfigError::InvalidTimeout(self.timeout_secs));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(())
    }
}
