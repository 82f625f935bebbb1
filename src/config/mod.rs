// Configuration module entry point
// Loads configuration from file, environment and defaults, and exposes runtime state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    CacheConfig, Config, FilesConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
};

/// Environment variable prefix, e.g. `DEVSERVE_SERVER__PORT=8080`
const ENV_PREFIX: &str = "DEVSERVE";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.access_log", defaults.logging.access_log)?
            .set_default("performance.keep_alive", defaults.performance.keep_alive)?
            .set_default("performance.read_timeout", defaults.performance.read_timeout)?
            .set_default("performance.write_timeout", defaults.performance.write_timeout)?
            .set_default("http.cors_origin", defaults.http.cors_origin)?
            .set_default("http.max_upload_size", defaults.http.max_upload_size)?
            .set_default("files.root", defaults.files.root)?
            .set_default("files.default_document", defaults.files.default_document)?
            .set_default("files.uploads_dir", defaults.files.uploads_dir)?
            .set_default("cache.etag_cache", defaults.cache.etag_cache)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
