// Application state module
// Shared, request-independent state handed to every handler

use std::path::PathBuf;

use super::types::Config;
use crate::http::cache::EtagCache;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Served root directory
    pub root: PathBuf,
    /// Directory uploads are written into
    pub uploads_dir: PathBuf,
    /// Present only when `cache.etag_cache` is enabled
    pub etag_cache: Option<EtagCache>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let etag_cache = config.cache.etag_cache.then(EtagCache::new);
        Self {
            root: PathBuf::from(&config.files.root),
            uploads_dir: PathBuf::from(&config.files.uploads_dir),
            config: config.clone(),
            etag_cache,
        }
    }
}
