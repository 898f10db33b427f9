use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::core::error::{AppError, Result};
use crate::modules::readiness::ReadinessProbe;

/// Ready when a GET to `url` answers with a 2xx status
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReadinessProbe for HttpProbe {
    fn target(&self) -> String {
        self.url.clone()
    }

    async fn check(&self) -> Result<()> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("GET {} failed: {}", self.url, e))
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AppError::ExternalServiceError(format!(
                "GET {} returned {}",
                self.url, status
            )))
        }
    }
}
