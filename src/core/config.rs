use std::env;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;

use crate::core::error::{AppError, Result};
use crate::features::tracking_server::StorageBackend;
use crate::modules::storage::AnonymousAccess;
use crate::shared::validation::BUCKET_NAME_REGEX;

/// Load `.env` if present. Must run before the logger is installed so that
/// `RUST_LOG` from the file applies.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        // Only report errors other than "file not found" - a missing .env is fine
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }
}

/// Read a variable through `lookup`, treating blank values as unset.
fn read<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    read(lookup, key)
        .ok_or_else(|| AppError::Config(format!("{} environment variable is required", key)))
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + ToString,
{
    read(lookup, key)
        .unwrap_or_else(|| default.to_string())
        .parse::<T>()
        .map_err(|_| AppError::Config(format!("{} must be a valid number", key)))
}

pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!(
            "{} must be a boolean (true/false), got '{}'",
            key, other
        ))),
    }
}

fn read_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    read(lookup, key).map(|v| parse_bool(key, &v)).transpose()
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Settings for the `serve` subcommand
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
    /// Tracking server executable (resolved through PATH)
    pub binary: String,
    /// Connection string for the metadata store
    pub backend_store_uri: String,
    pub storage: StorageConfig,
    /// Proxy artifact uploads/downloads through the tracking server
    pub serve_artifacts: bool,
    pub wait_for_backend_store: bool,
    /// Appended after all generated flags
    pub extra_args: Vec<String>,
}

/// Artifact storage selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// `ARTIFACT_ROOT`, used verbatim when present
    pub artifact_root_override: Option<String>,
    pub local_artifact_dir: String,
}

/// MinIO/S3 settings shared by `init-buckets` and the s3 path of `serve`
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket holding tracking artifacts
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Anonymous access granted on the bucket
    pub anonymous_access: AnonymousAccess,
}

/// Bounded polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct HealthcheckConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub timeout: Duration,
}

impl ServerConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 5000;
    const DEFAULT_WORKERS: u32 = 4;
    const DEFAULT_BINARY: &'static str = "mlflow";

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_store_uri = require(&lookup, "BACKEND_STORE_URI")?;

        let host = read(&lookup, "MLFLOW_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let port = read(&lookup, "MLFLOW_PORT")
            .unwrap_or_else(|| Self::DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("Invalid MLFLOW_PORT: {}", e)))?;

        let workers = parse_number(&lookup, "MLFLOW_WORKERS", Self::DEFAULT_WORKERS)?;
        if workers == 0 {
            return Err(AppError::Config(
                "MLFLOW_WORKERS must be at least 1".to_string(),
            ));
        }

        let binary =
            read(&lookup, "MLFLOW_BIN").unwrap_or_else(|| Self::DEFAULT_BINARY.to_string());

        let storage = StorageConfig::from_lookup(&lookup)?;

        // Filesystem artifacts are unreachable for remote clients unless proxied
        let serve_artifacts = read_bool(&lookup, "MLFLOW_SERVE_ARTIFACTS")?
            .unwrap_or(storage.backend == StorageBackend::Local);

        let wait_for_backend_store =
            read_bool(&lookup, "WAIT_FOR_BACKEND_STORE")?.unwrap_or(false);

        let extra_args = read(&lookup, "MLFLOW_EXTRA_ARGS")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            workers,
            binary,
            backend_store_uri,
            storage,
            serve_artifacts,
            wait_for_backend_store,
            extra_args,
        })
    }
}

impl StorageConfig {
    const DEFAULT_LOCAL_ARTIFACT_DIR: &'static str = "/mlflow/artifacts";

    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match read(lookup, "STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Local,
        };

        // Passed through untouched; only an all-blank value counts as unset
        let artifact_root_override =
            lookup("ARTIFACT_ROOT").filter(|v| !v.trim().is_empty());

        let local_artifact_dir = read(lookup, "LOCAL_ARTIFACT_DIR")
            .unwrap_or_else(|| Self::DEFAULT_LOCAL_ARTIFACT_DIR.to_string());
        if !Path::new(&local_artifact_dir).is_absolute() {
            return Err(AppError::Config(format!(
                "LOCAL_ARTIFACT_DIR must be an absolute path, got '{}'",
                local_artifact_dir
            )));
        }

        Ok(Self {
            backend,
            artifact_root_override,
            local_artifact_dir,
        })
    }
}

impl MinIOConfig {
    const DEFAULT_ENDPOINT: &'static str = "http://minio:9000";
    const DEFAULT_BUCKET: &'static str = "mlflow";
    const DEFAULT_REGION: &'static str = "us-east-1";

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = read(&lookup, "MINIO_ENDPOINT")
            .unwrap_or_else(|| Self::DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();
        let parsed = Url::parse(&endpoint)
            .map_err(|e| AppError::Config(format!("Invalid MINIO_ENDPOINT '{}': {}", endpoint, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(AppError::Config(format!(
                "MINIO_ENDPOINT must be an http(s) URL with a host, got '{}'",
                endpoint
            )));
        }

        let access_key = require(&lookup, "MINIO_ACCESS_KEY")?;
        let secret_key = require(&lookup, "MINIO_SECRET_KEY")?;

        let bucket =
            read(&lookup, "MINIO_BUCKET").unwrap_or_else(|| Self::DEFAULT_BUCKET.to_string());
        if !BUCKET_NAME_REGEX.is_match(&bucket) {
            return Err(AppError::Config(format!(
                "MINIO_BUCKET '{}' is not a valid bucket name",
                bucket
            )));
        }

        let region =
            read(&lookup, "MINIO_REGION").unwrap_or_else(|| Self::DEFAULT_REGION.to_string());

        let anonymous_access = match read(&lookup, "MINIO_ANONYMOUS_ACCESS") {
            Some(value) => value.parse::<AnonymousAccess>()?,
            None => AnonymousAccess::Download,
        };

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            anonymous_access,
        })
    }

    /// Liveness endpoint exposed by MinIO
    pub fn live_url(&self) -> String {
        format!("{}/minio/health/live", self.endpoint)
    }
}

impl WaitConfig {
    const DEFAULT_MAX_ATTEMPTS: u32 = 30;
    const DEFAULT_INTERVAL_SECS: u64 = 2;

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_attempts =
            parse_number(&lookup, "WAIT_MAX_ATTEMPTS", Self::DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(AppError::Config(
                "WAIT_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        let interval_secs =
            parse_number(&lookup, "WAIT_INTERVAL_SECS", Self::DEFAULT_INTERVAL_SECS)?;

        Ok(Self {
            max_attempts,
            interval: Duration::from_secs(interval_secs),
        })
    }
}

impl HealthcheckConfig {
    const DEFAULT_HOST: &'static str = "127.0.0.1";
    const DEFAULT_PATH: &'static str = "/health";
    const DEFAULT_TIMEOUT_SECS: u64 = 5;

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host =
            read(&lookup, "HEALTHCHECK_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let port = parse_number(&lookup, "MLFLOW_PORT", ServerConfig::DEFAULT_PORT)?;

        let mut path =
            read(&lookup, "HEALTHCHECK_PATH").unwrap_or_else(|| Self::DEFAULT_PATH.to_string());
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        let timeout_secs =
            parse_number(&lookup, "HEALTHCHECK_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            host,
            port,
            path,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }
}
