//! Container health probe against the running tracking server

use tracing::debug;

use crate::core::config::HealthcheckConfig;
use crate::core::error::Result;
use crate::modules::readiness::{HttpProbe, ReadinessProbe};

/// One GET against the server's health endpoint; any 2xx is healthy
pub async fn check(config: &HealthcheckConfig) -> Result<()> {
    let probe = HttpProbe::with_timeout(config.url(), config.timeout)?;
    probe.check().await?;
    debug!("{} is healthy", probe.target());
    Ok(())
}
