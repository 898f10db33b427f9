use tracing::info;

use crate::core::config::{MinIOConfig, WaitConfig};
use crate::core::error::Result;
use crate::modules::readiness::{wait_until_ready, HttpProbe};
use crate::modules::storage::{AnonymousAccess, BucketCreation, BucketPolicy, MinIOClient};

/// What a bucket initialization run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketInitReport {
    /// Readiness checks needed before MinIO answered
    pub attempts: u32,
    pub creation: BucketCreation,
    pub policy_applied: bool,
}

/// Service for preparing the artifact bucket
pub struct BucketInitService {
    config: MinIOConfig,
    wait: WaitConfig,
    client: MinIOClient,
}

impl BucketInitService {
    pub fn new(config: MinIOConfig, wait: WaitConfig) -> Result<Self> {
        let client = MinIOClient::new(&config)?;
        Ok(Self {
            config,
            wait,
            client,
        })
    }

    /// Wait for MinIO, then verify credentials, create the bucket and apply
    /// the anonymous-access policy. The first failure aborts the run.
    pub async fn run(&self) -> Result<BucketInitReport> {
        let probe = HttpProbe::new(self.config.live_url())?;
        let attempts = wait_until_ready(&probe, &self.wait).await?;

        self.client.verify_credentials().await?;
        info!("Connected to MinIO at {}", self.config.endpoint);

        let creation = self.client.ensure_bucket_exists().await?;

        let policy_applied = match self.config.anonymous_access {
            AnonymousAccess::Download => {
                let policy = BucketPolicy::anonymous_download(self.client.bucket_name());
                self.client.set_bucket_policy(&policy).await?;
                true
            }
            AnonymousAccess::None => {
                info!(
                    "Anonymous access disabled, leaving policy of '{}' untouched",
                    self.client.bucket_name()
                );
                false
            }
        };

        info!(
            "Bucket '{}' ready (created: {}, anonymous download: {})",
            self.client.bucket_name(),
            creation == BucketCreation::Created,
            policy_applied
        );

        Ok(BucketInitReport {
            attempts,
            creation,
            policy_applied,
        })
    }
}
