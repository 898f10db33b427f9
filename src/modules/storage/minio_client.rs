//! MinIO/S3-compatible administrative client
//!
//! Issues the idempotent bucket-configuration calls needed before the
//! tracking server can store artifacts: credential check, bucket creation
//! and anonymous-access policy.
//!
//! Uses rust-s3 crate for bucket creation and hand-signed requests for the
//! calls rust-s3 does not cover.

use chrono::Utc;
use reqwest::{Client, Method, Response, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info};

use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};
use crate::modules::storage::policy::BucketPolicy;
use crate::modules::storage::sigv4::SigV4Signer;

/// Result of a create-bucket call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCreation {
    Created,
    AlreadyExists,
}

/// MinIO/S3-compatible administrative client
pub struct MinIOClient {
    bucket_name: String,
    region: Region,
    credentials: Credentials,
    endpoint: Url,
    signer: SigV4Signer,
    /// HTTP client for signed admin requests
    http_client: Client,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration. No network calls are made.
    pub fn new(config: &MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| AppError::Config(format!("Invalid endpoint URL: {}", e)))?;

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            bucket_name: config.bucket.clone(),
            region,
            credentials,
            endpoint,
            signer: SigV4Signer::new(&config.access_key, &config.secret_key, &config.region),
            http_client,
        })
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Check the credentials with a signed ListBuckets call
    pub async fn verify_credentials(&self) -> Result<()> {
        let url = self.url_for("/", None)?;
        let response = self.send_signed(Method::GET, url, Vec::new()).await?;

        if response.status().is_success() {
            debug!("Credentials accepted by {}", self.endpoint);
            Ok(())
        } else {
            Err(Self::failure("Credential check", response).await)
        }
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<BucketCreation> {
        let outcome = Bucket::create_with_path_style(
            &self.bucket_name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        let creation = match outcome {
            Ok(response) => {
                classify_create_response(response.response_code, &response.response_text)
            }
            // Depending on features rust-s3 reports HTTP failures as errors
            Err(e) => classify_create_error(&e.to_string()),
        };

        match creation {
            Some(BucketCreation::Created) => {
                info!("Bucket '{}' created", self.bucket_name);
                Ok(BucketCreation::Created)
            }
            Some(BucketCreation::AlreadyExists) => {
                debug!("Bucket '{}' already exists", self.bucket_name);
                Ok(BucketCreation::AlreadyExists)
            }
            None => Err(AppError::Storage(format!(
                "Failed to create bucket '{}'",
                self.bucket_name
            ))),
        }
    }

    /// Replace the bucket policy with `policy`
    pub async fn set_bucket_policy(&self, policy: &BucketPolicy) -> Result<()> {
        let body = policy.to_json()?;
        let url = self.url_for(&format!("/{}", self.bucket_name), Some("policy"))?;

        let response = self
            .send_signed(Method::PUT, url, body.into_bytes())
            .await?;

        if response.status().is_success() {
            info!("Bucket policy applied to '{}'", self.bucket_name);
            Ok(())
        } else {
            Err(Self::failure("Setting bucket policy", response).await)
        }
    }

    fn url_for(&self, path: &str, query: Option<&str>) -> Result<Url> {
        let mut url = self
            .endpoint
            .join(path)
            .map_err(|e| AppError::Internal(format!("Invalid request path '{}': {}", path, e)))?;
        url.set_query(query);
        Ok(url)
    }

    async fn send_signed(&self, method: Method, url: Url, body: Vec<u8>) -> Result<Response> {
        let signed = self.signer.sign(method.as_str(), &url, &body, Utc::now())?;

        self.http_client
            .request(method, url.clone())
            .header("Host", &signed.host)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.payload_hash)
            .header("Authorization", &signed.authorization)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Request to {} failed: {}", url, e))
            })
    }

    async fn failure(action: &str, response: Response) -> AppError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        AppError::Storage(format!("{} failed: {} - {}", action, status, body))
    }
}

fn is_already_exists(text: &str) -> bool {
    text.contains("BucketAlreadyOwnedByYou")
        || text.contains("BucketAlreadyExists")
        || text.contains("already own it")
}

fn classify_create_response(status: u16, body: &str) -> Option<BucketCreation> {
    if (200..300).contains(&status) {
        Some(BucketCreation::Created)
    } else if status == 409 && is_already_exists(body) {
        Some(BucketCreation::AlreadyExists)
    } else {
        tracing::error!("Create bucket returned {}: {}", status, body);
        None
    }
}

fn classify_create_error(message: &str) -> Option<BucketCreation> {
    if is_already_exists(message) {
        Some(BucketCreation::AlreadyExists)
    } else {
        tracing::error!("Create bucket failed: {}", message);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::AnonymousAccess;
    use crate::shared::test_helpers::{spawn_fake_server, FakeResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ALREADY_OWNED: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
        <Error><Code>BucketAlreadyOwnedByYou</Code>\
        <Message>Your previous request to create the named bucket succeeded and you already own it.</Message>\
        </Error>";

    fn config(endpoint: &str) -> MinIOConfig {
        MinIOConfig {
            endpoint: endpoint.to_string(),
            access_key: "admin".to_string(),
            secret_key: "password".to_string(),
            bucket: "mlflow".to_string(),
            region: "us-east-1".to_string(),
            anonymous_access: AnonymousAccess::Download,
        }
    }

    #[test]
    fn test_classify_create_response() {
        assert_eq!(
            classify_create_response(200, ""),
            Some(BucketCreation::Created)
        );
        assert_eq!(
            classify_create_response(409, ALREADY_OWNED),
            Some(BucketCreation::AlreadyExists)
        );
        assert_eq!(classify_create_response(403, "AccessDenied"), None);
        assert_eq!(classify_create_response(409, "OperationAborted"), None);
    }

    #[test]
    fn test_classify_create_error() {
        assert_eq!(
            classify_create_error("Got HTTP 409 with content 'BucketAlreadyExists'"),
            Some(BucketCreation::AlreadyExists)
        );
        assert_eq!(classify_create_error("connection refused"), None);
    }

    #[tokio::test]
    async fn test_verify_credentials_sends_signed_list_buckets() {
        let server = spawn_fake_server(|_, _| FakeResponse::ok("<ListAllMyBucketsResult/>")).await;
        let client = MinIOClient::new(&config(&server.base_url)).unwrap();

        client.verify_credentials().await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/");
        let auth = requests[0].header("authorization").unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=admin/"));
        assert!(requests[0].header("x-amz-date").is_some());
    }

    #[tokio::test]
    async fn test_verify_credentials_rejected() {
        let server = spawn_fake_server(|_, _| FakeResponse::new(403, "InvalidAccessKeyId")).await;
        let client = MinIOClient::new(&config(&server.base_url)).unwrap();

        let err = client.verify_credentials().await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_set_bucket_policy_puts_json_document() {
        let server = spawn_fake_server(|_, _| FakeResponse::new(204, "")).await;
        let client = MinIOClient::new(&config(&server.base_url)).unwrap();

        client
            .set_bucket_policy(&BucketPolicy::anonymous_download("mlflow"))
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path, "/mlflow");
        assert_eq!(requests[0].query.as_deref(), Some("policy"));

        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["Statement"][1]["Resource"][0], "arn:aws:s3:::mlflow/*");
    }

    #[tokio::test]
    async fn test_set_bucket_policy_failure_is_reported() {
        let server = spawn_fake_server(|_, _| FakeResponse::new(400, "MalformedPolicy")).await;
        let client = MinIOClient::new(&config(&server.base_url)).unwrap();

        let err = client
            .set_bucket_policy(&BucketPolicy::anonymous_download("mlflow"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("MalformedPolicy"));
    }

    #[tokio::test]
    async fn test_ensure_bucket_exists_is_idempotent() {
        let puts = AtomicUsize::new(0);
        let server = spawn_fake_server(move |request, _| {
            if request.method != "PUT" {
                return FakeResponse::ok("");
            }
            if puts.fetch_add(1, Ordering::SeqCst) == 0 {
                FakeResponse::ok("")
            } else {
                FakeResponse::new(409, ALREADY_OWNED)
            }
        })
        .await;
        let client = MinIOClient::new(&config(&server.base_url)).unwrap();

        assert_eq!(
            client.ensure_bucket_exists().await.unwrap(),
            BucketCreation::Created
        );
        assert_eq!(
            client.ensure_bucket_exists().await.unwrap(),
            BucketCreation::AlreadyExists
        );

        let puts: Vec<_> = server
            .requests()
            .into_iter()
            .filter(|r| r.method == "PUT")
            .collect();
        assert_eq!(puts.len(), 2);
        assert!(puts[0].path.starts_with("/mlflow"));
    }

    #[tokio::test]
    async fn test_ensure_bucket_exists_fails_on_denied() {
        let server = spawn_fake_server(|_, _| FakeResponse::new(403, "AccessDenied")).await;
        let client = MinIOClient::new(&config(&server.base_url)).unwrap();

        assert!(client.ensure_bucket_exists().await.is_err());
    }
}
