//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `TITRATE_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_EMBEDDING_CACHE_CAPACITY, DEFAULT_EMBEDDING_TIMEOUT_MS, DEFAULT_RECENT_POOL_SIZE,
    MatchThresholds,
};

/// Server and engine configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `TITRATE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// SQLite database file. `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,

    /// Base directory that relative interaction image paths are resolved against.
    pub assets_dir: Option<PathBuf>,

    /// Base URL of an OpenAI-compatible embeddings API. `None` selects the stub embedder.
    pub embedding_url: Option<String>,

    /// Embedding model name sent with each request.
    pub embedding_model: String,

    /// Bearer token for the embeddings API.
    pub embedding_api_key: Option<String>,

    /// Per-call embedding timeout in milliseconds. Default: `10_000`.
    pub embedding_timeout_ms: u64,

    /// Max memoised embeddings. Default: `1_024`.
    pub embedding_cache_capacity: u64,

    /// Most-recently-used entries scanned per lookup. Default: `200`.
    pub recent_pool_size: usize,

    /// Matching thresholds.
    pub thresholds: MatchThresholds,
}

/// Embedding model used when `TITRATE_EMBEDDING_MODEL` is not set.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            database_path: None,
            assets_dir: None,
            embedding_url: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_api_key: None,
            embedding_timeout_ms: DEFAULT_EMBEDDING_TIMEOUT_MS,
            embedding_cache_capacity: DEFAULT_EMBEDDING_CACHE_CAPACITY,
            recent_pool_size: DEFAULT_RECENT_POOL_SIZE,
            thresholds: MatchThresholds::default(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "TITRATE_PORT";
    const ENV_BIND_ADDR: &'static str = "TITRATE_BIND_ADDR";
    const ENV_DATABASE_PATH: &'static str = "TITRATE_DATABASE_PATH";
    const ENV_ASSETS_DIR: &'static str = "TITRATE_ASSETS_DIR";
    const ENV_EMBEDDING_URL: &'static str = "TITRATE_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "TITRATE_EMBEDDING_MODEL";
    const ENV_EMBEDDING_API_KEY: &'static str = "TITRATE_EMBEDDING_API_KEY";
    const ENV_EMBEDDING_TIMEOUT_MS: &'static str = "TITRATE_EMBEDDING_TIMEOUT_MS";
    const ENV_EMBEDDING_CACHE_CAPACITY: &'static str = "TITRATE_EMBEDDING_CACHE_CAPACITY";
    const ENV_RECENT_POOL_SIZE: &'static str = "TITRATE_RECENT_POOL_SIZE";
    const ENV_EXACT_THRESHOLD: &'static str = "TITRATE_EXACT_THRESHOLD";
    const ENV_HIGH_CONFIDENCE: &'static str = "TITRATE_HIGH_CONFIDENCE";
    const ENV_MEDIUM_CONFIDENCE: &'static str = "TITRATE_MEDIUM_CONFIDENCE";
    const ENV_SEMANTIC_THRESHOLD: &'static str = "TITRATE_SEMANTIC_THRESHOLD";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let database_path = Self::parse_optional_path_from_env(Self::ENV_DATABASE_PATH);
        let assets_dir = Self::parse_optional_path_from_env(Self::ENV_ASSETS_DIR);
        let embedding_url = Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_URL);
        let embedding_model =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_MODEL, defaults.embedding_model);
        let embedding_api_key = Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_API_KEY);
        let embedding_timeout_ms = Self::parse_u64_from_env(
            Self::ENV_EMBEDDING_TIMEOUT_MS,
            defaults.embedding_timeout_ms,
        );
        let embedding_cache_capacity = Self::parse_u64_from_env(
            Self::ENV_EMBEDDING_CACHE_CAPACITY,
            defaults.embedding_cache_capacity,
        );
        let recent_pool_size = Self::parse_u64_from_env(
            Self::ENV_RECENT_POOL_SIZE,
            defaults.recent_pool_size as u64,
        ) as usize;

        let thresholds = MatchThresholds {
            exact: Self::parse_threshold_from_env(
                Self::ENV_EXACT_THRESHOLD,
                defaults.thresholds.exact,
            )?,
            high_confidence: Self::parse_threshold_from_env(
                Self::ENV_HIGH_CONFIDENCE,
                defaults.thresholds.high_confidence,
            )?,
            medium_confidence: Self::parse_threshold_from_env(
                Self::ENV_MEDIUM_CONFIDENCE,
                defaults.thresholds.medium_confidence,
            )?,
            semantic: Self::parse_threshold_from_env(
                Self::ENV_SEMANTIC_THRESHOLD,
                defaults.thresholds.semantic,
            )?,
        };

        Ok(Self {
            port,
            bind_addr,
            database_path,
            assets_dir,
            embedding_url,
            embedding_model,
            embedding_api_key,
            embedding_timeout_ms,
            embedding_cache_capacity,
            recent_pool_size,
            thresholds,
        })
    }

    /// Validates paths and numeric invariants (does not create anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.database_path {
            if path.is_dir() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.exists() {
                    return Err(ConfigError::PathNotFound {
                        path: parent.to_path_buf(),
                    });
                }
            }
        }

        if let Some(ref path) = self.assets_dir {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if self.recent_pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_RECENT_POOL_SIZE,
                value: "0".to_string(),
            });
        }

        if self.embedding_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_EMBEDDING_TIMEOUT_MS,
                value: "0".to_string(),
            });
        }

        self.thresholds.validate()?;

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Embedding timeout as a [`Duration`].
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_threshold_from_env(var_name: &'static str, default: f64) -> Result<f64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::ThresholdParseError {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
