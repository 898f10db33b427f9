//! Storage module for artifact bucket administration
//!
//! Provides a MinIO/S3-compatible admin client, request signing and the
//! bucket access policy document.

mod minio_client;
mod policy;
mod sigv4;

pub use minio_client::{BucketCreation, MinIOClient};
pub use policy::{AnonymousAccess, BucketPolicy};
