//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Server lifecycle logging
//! - Access logging
//! - Error and warning logging
//!
//! Events go through `tracing`; the subscriber is installed by [`init`].

mod access;

pub use access::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logger with configuration
///
/// Should be called once at application startup. `RUST_LOG` takes precedence
/// over `logging.level`.
pub fn init(config: &Config) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("Server started, listening on http://{addr}");
    tracing::info!(
        root = %config.files.root,
        default_document = %config.files.default_document,
        uploads_dir = %config.files.uploads_dir,
        "Serving files"
    );
    tracing::info!(cors_origin = %config.http.cors_origin, "CORS origin");
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if config.cache.etag_cache {
        tracing::info!("ETag cache enabled");
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(%peer_addr, "Connection accepted");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry) {
    tracing::info!(
        target: "access",
        method = %entry.method,
        path = %entry.path,
        status = entry.status,
        body_bytes = entry.body_bytes,
        elapsed_us = entry.request_time_us,
        "{}",
        entry.format_common()
    );
}

pub fn log_upload_saved(file_name: &str, size: u64) {
    tracing::info!(file_name, size, "File uploaded");
}

pub fn log_websocket_opened() {
    tracing::info!("WebSocket connection established");
}

pub fn log_websocket_message(message: &str) {
    tracing::info!("Received WebSocket message: {message}");
}

pub fn log_websocket_closed(reason: &str) {
    tracing::info!("WebSocket connection closed: {reason}");
}

pub fn log_shutdown() {
    tracing::info!("Shutdown signal received, no longer accepting connections");
}
