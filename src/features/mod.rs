pub mod bucket_init;
pub mod healthcheck;
pub mod tracking_server;
