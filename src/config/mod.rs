use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Storage connection string is missing '{0}'")]
    MissingKey(&'static str),

    #[error("Malformed storage connection string segment: '{0}'")]
    MalformedSegment(String),

    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("{field} must be between {min:?} and {max:?}, got {value:?}")]
    OutOfRange {
        field: &'static str,
        value: Duration,
        min: Duration,
        max: Duration,
    },
}

/// Longest dedup window accepted from configuration (one week).
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const MAX_SUMMARIZER_TIMEOUT: Duration = Duration::from_secs(15 * 60);
const MIN_DURATION: Duration = Duration::from_secs(1);

fn check_range(field: &'static str, value: Duration, max: Duration) -> Result<(), ConfigError> {
    if value < MIN_DURATION || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: MIN_DURATION,
            max,
        });
    }
    Ok(())
}

/// Parsed form of `STORAGE_CONNECTION_STRING`.
///
/// Format: `Endpoint=http://127.0.0.1:9000;AccessKeyId=...;SecretAccessKey=...;Region=us-east-1`.
/// Keys are case-insensitive, `Region` is optional.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConnection {
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl std::fmt::Debug for StorageConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConnection")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl StorageConnection {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut endpoint = None;
        let mut access_key_id = None;
        let mut secret_access_key = None;
        let mut region = None;

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedSegment(segment.to_string()))?;
            let value = value.trim().to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value),
                "accesskeyid" => access_key_id = Some(value),
                "secretaccesskey" => secret_access_key = Some(value),
                "region" => region = Some(value),
                _ => {
                    tracing::warn!("Ignoring unknown storage connection key '{}'", key.trim());
                }
            }
        }

        let endpoint = endpoint.ok_or(ConfigError::MissingKey("Endpoint"))?;
        url::Url::parse(&endpoint).map_err(|e| ConfigError::InvalidUrl {
            field: "Endpoint",
            reason: e.to_string(),
        })?;

        Ok(Self {
            endpoint,
            access_key_id: access_key_id.ok_or(ConfigError::MissingKey("AccessKeyId"))?,
            secret_access_key: secret_access_key
                .ok_or(ConfigError::MissingKey("SecretAccessKey"))?,
            region: region.unwrap_or_else(|| "us-east-1".to_string()),
        })
    }
}

/// Runtime configuration for the document service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Raw blob storage connection string (required to start the server)
    pub storage_connection_string: Option<String>,

    /// Container (bucket) holding uploaded documents (default: "documents")
    pub container_name: String,

    /// Key prefix for uploaded documents (default: "uploads/docs")
    pub upload_prefix: String,

    /// Lifetime of a dedup cache entry (default: 10 minutes)
    pub cache_ttl: Duration,

    /// Serialize concurrent uploads of the same content (default: false)
    pub single_flight: bool,

    /// How often expired cache entries are swept (default: 60 seconds)
    pub cache_sweep_interval: Duration,

    /// Summarization endpoint
    pub summarizer_url: String,

    /// Deadline for a single summarization call (default: 100 seconds)
    pub summarizer_timeout: Duration,

    /// Maximum upload size in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// Allowed CORS origins (comma separated in env)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_connection_string: None,
            container_name: "documents".to_string(),
            upload_prefix: "uploads/docs".to_string(),
            cache_ttl: Duration::from_secs(10 * 60),
            single_flight: false,
            cache_sweep_interval: Duration::from_secs(60),
            summarizer_url: "http://127.0.0.1:8000/api/summary-pdf".to_string(),
            summarizer_timeout: Duration::from_secs(100),
            max_file_size: 50 * 1024 * 1024, // 50 MB
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            storage_connection_string: env::var("STORAGE_CONNECTION_STRING").ok(),

            container_name: env::var("STORAGE_CONTAINER_NAME").unwrap_or(default.container_name),

            upload_prefix: env::var("UPLOAD_PREFIX")
                .map(|v| v.trim_matches('/').to_string())
                .unwrap_or(default.upload_prefix),

            cache_ttl: env_secs("DEDUP_CACHE_TTL_SECS").unwrap_or(default.cache_ttl),

            single_flight: env_flag("DEDUP_SINGLE_FLIGHT").unwrap_or(default.single_flight),

            cache_sweep_interval: env_secs("CACHE_SWEEP_INTERVAL_SECS")
                .unwrap_or(default.cache_sweep_interval),

            summarizer_url: env::var("SUMMARIZER_URL").unwrap_or(default.summarizer_url),

            summarizer_timeout: env_secs("SUMMARIZER_TIMEOUT_SECS")
                .unwrap_or(default.summarizer_timeout),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Config for local development and tests (short cache window, local endpoints)
    pub fn development() -> Self {
        Self {
            storage_connection_string: Some(
                "Endpoint=http://127.0.0.1:9000;AccessKeyId=minioadmin;SecretAccessKey=minioadmin"
                    .to_string(),
            ),
            cache_ttl: Duration::from_secs(60),
            cache_sweep_interval: Duration::from_secs(10),
            summarizer_timeout: Duration::from_secs(5),
            ..Self::default()
        }
    }

    /// Parses the storage connection string, failing if it is absent.
    pub fn storage_connection(&self) -> Result<StorageConnection, ConfigError> {
        let raw = self
            .storage_connection_string
            .as_deref()
            .ok_or(ConfigError::MissingKey("STORAGE_CONNECTION_STRING"))?;
        StorageConnection::parse(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.summarizer_url).map_err(|e| ConfigError::InvalidUrl {
            field: "SUMMARIZER_URL",
            reason: e.to_string(),
        })?;
        check_range("DEDUP_CACHE_TTL_SECS", self.cache_ttl, MAX_CACHE_TTL)?;
        check_range(
            "CACHE_SWEEP_INTERVAL_SECS",
            self.cache_sweep_interval,
            MAX_SWEEP_INTERVAL,
        )?;
        check_range(
            "SUMMARIZER_TIMEOUT_SECS",
            self.summarizer_timeout,
            MAX_SUMMARIZER_TIMEOUT,
        )?;
        Ok(())
    }
}
