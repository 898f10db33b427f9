//! Bounded readiness polling
//!
//! A fixed number of attempts with a fixed pause between them. No backoff,
//! no jitter.

mod http_probe;

pub use http_probe::HttpProbe;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core::config::WaitConfig;
use crate::core::error::{AppError, Result};

/// Something that can answer "are you up yet?"
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Human-readable name of what is being probed, safe to log
    fn target(&self) -> String;

    async fn check(&self) -> Result<()>;
}

/// Poll `probe` until it succeeds or `wait.max_attempts` checks have failed.
///
/// Returns the 1-based attempt number of the first success. Sleeps
/// `wait.interval` between attempts but not after the last one.
pub async fn wait_until_ready<P>(probe: &P, wait: &WaitConfig) -> Result<u32>
where
    P: ReadinessProbe + ?Sized,
{
    let target = probe.target();
    info!(
        "Waiting for {} (max {} attempts, {:?} apart)",
        target, wait.max_attempts, wait.interval
    );

    for attempt in 1..=wait.max_attempts {
        match probe.check().await {
            Ok(()) => {
                info!("{} is ready after {} attempt(s)", target, attempt);
                return Ok(attempt);
            }
            Err(e) => {
                debug!("Attempt {}/{} for {}: {}", attempt, wait.max_attempts, target, e);
            }
        }

        if attempt < wait.max_attempts {
            tokio::time::sleep(wait.interval).await;
        }
    }

    warn!("Giving up on {} after {} attempts", target, wait.max_attempts);
    Err(AppError::NotReady {
        target,
        attempts: wait.max_attempts,
    })
}
