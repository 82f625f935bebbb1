//! Cache validation module
//!
//! Provides content-hash `ETag`s, HTTP-date formatting for `Last-Modified`,
//! and an optional `ETag` cache keyed on file identity.

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

/// Generate an `ETag` from file content
///
/// The value only depends on the bytes, never on the file name.
///
/// # Returns
/// Quoted hex MD5 digest, e.g., `"5d41402abc4b2a76b9719d911017c592"`
pub fn generate_etag(content: &[u8]) -> String {
    format!("\"{:x}\"", Md5::digest(content))
}

/// Check the client's `If-None-Match` against the server's `ETag`
///
/// Exact byte-for-byte comparison: no list splitting, no weak validators,
/// no wildcard.
pub fn etag_matches(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| client_etag == etag)
}

/// Format a timestamp as an HTTP date (`Mon, 02 Jan 2006 15:04:05 GMT`)
pub fn format_http_date(time: SystemTime) -> String {
    let utc: DateTime<Utc> = time.into();
    utc.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// File identity used as the cache key; any content rewrite bumps mtime or size
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FileKey {
    path: PathBuf,
    modified: SystemTime,
    len: u64,
}

/// `(path, mtime, size) -> ETag` cache shared across requests
#[derive(Debug, Default)]
pub struct EtagCache {
    entries: RwLock<HashMap<FileKey, String>>,
}

impl EtagCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached `ETag`
    pub fn get(&self, path: &Path, modified: SystemTime, len: u64) -> Option<String> {
        let key = FileKey {
            path: path.to_path_buf(),
            modified,
            len,
        };
        self.entries.read().ok()?.get(&key).cloned()
    }

    /// Store an `ETag`, dropping stale entries for the same path
    pub fn insert(&self, path: &Path, modified: SystemTime, len: u64, etag: String) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        entries.retain(|k, _| k.path != path);
        entries.insert(
            FileKey {
                path: path.to_path_buf(),
                modified,
                len,
            },
            etag,
        );
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or_default()
    }
}
