//! Bucket access policy documents

use serde::Serialize;
use std::str::FromStr;

use crate::core::error::{AppError, Result};

const POLICY_VERSION: &str = "2012-10-17";

/// Anonymous access level granted on the artifact bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnonymousAccess {
    /// Anyone may list the bucket and read objects
    Download,
    /// No anonymous access; the policy call is skipped
    None,
}

impl FromStr for AnonymousAccess {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "download" => Ok(Self::Download),
            "none" | "private" => Ok(Self::None),
            other => Err(AppError::Config(format!(
                "MINIO_ANONYMOUS_ACCESS must be 'download' or 'none', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketPolicy {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: String,
    pub principal: Principal,
    pub action: Vec<String>,
    pub resource: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    #[serde(rename = "AWS")]
    pub aws: Vec<String>,
}

impl Principal {
    fn anyone() -> Self {
        Self {
            aws: vec!["*".to_string()],
        }
    }
}

impl BucketPolicy {
    /// Same grants as `mc anonymous set download`: list and locate the bucket,
    /// read every object in it.
    pub fn anonymous_download(bucket: &str) -> Self {
        let allow = |actions: &[&str], resource: String| PolicyStatement {
            effect: "Allow".to_string(),
            principal: Principal::anyone(),
            action: actions.iter().map(|a| a.to_string()).collect(),
            resource: vec![resource],
        };

        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![
                allow(
                    &["s3:GetBucketLocation", "s3:ListBucket"],
                    format!("arn:aws:s3:::{}", bucket),
                ),
                allow(&["s3:GetObject"], format!("arn:aws:s3:::{}/*", bucket)),
            ],
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize bucket policy: {}", e)))
    }
}
