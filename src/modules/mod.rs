//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and probes for the external services the launcher
//! configures: object storage and readiness checks.

pub mod readiness;
pub mod storage;
