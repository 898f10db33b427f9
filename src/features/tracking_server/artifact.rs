use std::fmt;
use std::str::FromStr;

use crate::core::config::{MinIOConfig, StorageConfig};
use crate::core::error::{AppError, Result};

/// Where artifacts are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Filesystem of the tracking server container
    Local,
    /// S3-compatible object storage (MinIO)
    S3,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "file" | "filesystem" => Ok(Self::Local),
            "s3" | "minio" => Ok(Self::S3),
            _ => Err(AppError::InvalidStorageBackend(s.trim().to_string())),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::S3 => f.write_str("s3"),
        }
    }
}

/// Compute the artifact root URI.
///
/// | backend | `ARTIFACT_ROOT` | result                 |
/// |---------|-----------------|------------------------|
/// | any     | set             | the override, verbatim |
/// | local   | unset           | `LOCAL_ARTIFACT_DIR`   |
/// | s3      | unset           | `s3://{MINIO_BUCKET}`  |
///
/// The s3 backend needs MinIO settings even with an override, since the
/// server process still has to reach the store.
pub fn resolve_artifact_root(storage: &StorageConfig, minio: Option<&MinIOConfig>) -> Result<String> {
    let s3_bucket = match (storage.backend, minio) {
        (StorageBackend::S3, Some(minio)) => Some(minio.bucket.as_str()),
        (StorageBackend::S3, None) => {
            return Err(AppError::Config(
                "STORAGE_BACKEND=s3 requires MINIO_ACCESS_KEY and MINIO_SECRET_KEY".to_string(),
            ))
        }
        (StorageBackend::Local, _) => None,
    };

    if let Some(root) = &storage.artifact_root_override {
        return Ok(root.clone());
    }

    Ok(match s3_bucket {
        Some(bucket) => format!("s3://{}", bucket),
        None => storage.local_artifact_dir.clone(),
    })
}
