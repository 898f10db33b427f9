//! Object storage bootstrap
//!
//! Waits for MinIO to answer, then makes the artifact bucket usable by the
//! tracking server. Every step is idempotent so the job can rerun on each
//! deployment.

mod service;

pub use service::{BucketInitReport, BucketInitService};

use crate::core::config::{MinIOConfig, WaitConfig};
use crate::core::error::Result;

pub async fn run_from_env() -> Result<BucketInitReport> {
    let minio = MinIOConfig::from_env()?;
    let wait = WaitConfig::from_env()?;

    BucketInitService::new(minio, wait)?.run().await
}
