// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub files: FilesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub access_log: bool,
}

/// Performance configuration
///
/// Timeouts are in seconds, `0` disables the per-connection timeout.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Origin allowed by `Access-Control-Allow-Origin` on file and upload responses
    pub cors_origin: String,
    /// Upper bound for a multipart upload body in bytes, `0` for no limit
    pub max_upload_size: u64,
}

/// Filesystem layout of the served site
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FilesConfig {
    /// Directory that request paths are resolved against
    pub root: String,
    /// Document served for `/`
    pub default_document: String,
    /// Directory receiving uploaded files
    pub uploads_dir: String,
}

/// `ETag` cache configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CacheConfig {
    /// Reuse `ETag`s for files whose mtime and size are unchanged
    #[serde(default)]
    pub etag_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 4221,
                workers: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: true,
            },
            performance: PerformanceConfig {
                keep_alive: true,
                read_timeout: 0,
                write_timeout: 0,
                max_connections: None,
            },
            http: HttpConfig {
                cors_origin: "http://127.0.0.1:5500".to_string(),
                max_upload_size: 0,
            },
            files: FilesConfig {
                root: ".".to_string(),
                default_document: "index.html".to_string(),
                uploads_dir: "uploads".to_string(),
            },
            cache: CacheConfig::default(),
        }
    }
}
