use async_trait::async_trait;
use sqlx::{postgres::PgConnectOptions, ConnectOptions, Connection};
use std::str::FromStr;
use std::time::Duration;

use crate::core::error::{AppError, Result};
use crate::modules::readiness::ReadinessProbe;
use crate::shared::validation::redact_uri;

/// Whether `uri` points at PostgreSQL, the only store we can probe directly
pub fn is_postgres_uri(uri: &str) -> bool {
    let scheme = uri.split("://").next().unwrap_or_default();
    // SQLAlchemy-style driver suffixes, e.g. postgresql+psycopg2
    let base = scheme.split('+').next().unwrap_or_default();
    matches!(base, "postgres" | "postgresql")
}

/// Ready when a single connection to the metadata store can be opened
pub struct PostgresProbe {
    options: PgConnectOptions,
    display: String,
    timeout: Duration,
}

impl PostgresProbe {
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

    pub fn new(uri: &str) -> Result<Self> {
        // sqlx does not understand SQLAlchemy driver suffixes
        let normalized = match uri.split_once("://") {
            Some((scheme, rest)) if scheme.contains('+') => format!("postgres://{}", rest),
            _ => uri.to_string(),
        };

        let options = PgConnectOptions::from_str(&normalized).map_err(|e| {
            AppError::Config(format!(
                "Invalid BACKEND_STORE_URI '{}': {}",
                redact_uri(uri),
                e
            ))
        })?;

        Ok(Self {
            options: options.disable_statement_logging(),
            display: redact_uri(uri),
            timeout: Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
        })
    }
}

#[async_trait]
impl ReadinessProbe for PostgresProbe {
    fn target(&self) -> String {
        self.display.clone()
    }

    async fn check(&self) -> Result<()> {
        let connection = tokio::time::timeout(self.timeout, self.options.connect())
            .await
            .map_err(|_| {
                AppError::ExternalServiceError(format!(
                    "Timed out connecting to {}",
                    self.display
                ))
            })??;
        connection.close().await?;
        Ok(())
    }
}
