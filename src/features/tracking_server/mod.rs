//! Tracking server entrypoint
//!
//! Validates settings, resolves the artifact root, optionally waits for the
//! metadata store, and assembles the `mlflow server` invocation.

mod artifact;
mod command;
mod launcher;

pub use artifact::{resolve_artifact_root, StorageBackend};
pub use command::ServerCommand;
pub use launcher::launch;

use tracing::{info, warn};

use crate::core::config::{MinIOConfig, ServerConfig, WaitConfig};
use crate::core::database::{is_postgres_uri, PostgresProbe};
use crate::core::error::Result;
use crate::modules::readiness::wait_until_ready;
use crate::shared::validation::redact_uri;

/// Load every setting `serve` needs from the environment and build the command
pub async fn prepare_from_env() -> Result<ServerCommand> {
    let config = ServerConfig::from_env()?;
    let minio = match config.storage.backend {
        StorageBackend::S3 => Some(MinIOConfig::from_env()?),
        StorageBackend::Local => None,
    };
    let wait = WaitConfig::from_env()?;

    prepare(&config, minio.as_ref(), &wait).await
}

pub async fn prepare(
    config: &ServerConfig,
    minio: Option<&MinIOConfig>,
    wait: &WaitConfig,
) -> Result<ServerCommand> {
    let artifact_root = resolve_artifact_root(&config.storage, minio)?;
    info!(
        "Storage backend: {}, artifact root: {}, serve artifacts: {}",
        config.storage.backend, artifact_root, config.serve_artifacts
    );
    info!(
        "Backend store: {}",
        redact_uri(&config.backend_store_uri)
    );

    if config.wait_for_backend_store {
        if is_postgres_uri(&config.backend_store_uri) {
            let probe = PostgresProbe::new(&config.backend_store_uri)?;
            wait_until_ready(&probe, wait).await?;
        } else {
            warn!(
                "WAIT_FOR_BACKEND_STORE is set but only PostgreSQL stores can be probed; skipping"
            );
        }
    }

    Ok(ServerCommand::build(config, &artifact_root, minio))
}
