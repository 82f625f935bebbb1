//! Static file serving module
//!
//! Resolves a request path under the served root, validates caches with
//! `ETag`/`Last-Modified`, and produces the (optionally ranged, optionally
//! gzipped) body.
//!
//! Every response is request-scoped: metadata is recomputed per call unless
//! the `ETag` cache is enabled, and the file handle is dropped on every exit.

use crate::config::AppState;
use crate::http::{self, cache, mime, RangeSpec};
use crate::logger;
use flate2::write::GzEncoder;
use flate2::Compression;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::io::{SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Hints extracted from the request by the dispatcher
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRequest<'a> {
    pub path: &'a str,
    pub accepts_gzip: bool,
    pub range: RangeSpec,
    pub if_none_match: Option<&'a str>,
}

/// Failures while producing body bytes; logged, never surfaced to the client
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to seek to offset {offset}: {source}")]
    Seek {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read file: {0}")]
    Read(#[source] std::io::Error),
    #[error("gzip encoding failed: {0}")]
    Compress(#[source] std::io::Error),
}

/// Request path mapped onto the filesystem
#[derive(Debug, PartialEq, Eq)]
enum Resolved {
    /// `/`; existence is not checked up front
    DefaultDocument(PathBuf),
    /// Existing regular file inside the served root
    File(PathBuf),
    NotFound,
}

/// `ETag` and `Last-Modified` for one request
#[derive(Debug, Default)]
struct ValidationMetadata {
    etag: Option<String>,
    last_modified: Option<String>,
}

/// Serve a file for a GET request
pub async fn serve_file(state: &AppState, req: &FileRequest<'_>) -> Response<Full<Bytes>> {
    let cors_origin = state.config.http.cors_origin.as_str();

    let file_path = match resolve(&state.root, &state.config.files.default_document, req.path).await
    {
        Resolved::DefaultDocument(p) | Resolved::File(p) => p,
        Resolved::NotFound => return http::build_404_response(cors_origin),
    };

    let meta = validation_metadata(state, &file_path).await;

    let mut builder = http::response::with_cors(Response::builder(), cors_origin);
    if let Some(ref last_modified) = meta.last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }
    if let Some(ref etag) = meta.etag {
        builder = builder.header("ETag", etag);
        if cache::etag_matches(req.if_none_match, etag) {
            let builder = builder.status(StatusCode::NOT_MODIFIED);
            return http::response::finish(builder, StatusCode::NOT_MODIFIED, Bytes::new());
        }
    }

    let mut file = match File::open(&file_path).await {
        Ok(f) => f,
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to open '{}': {e}",
                file_path.display()
            ));
            return http::build_404_response(cors_origin);
        }
    };

    let mut window = Vec::new();
    if let Err(e) = read_window(&mut file, req.range, &mut window).await {
        logger::log_error(&format!("{}: {e}", file_path.display()));
    }
    drop(file);

    builder = builder
        .status(StatusCode::OK)
        .header("Content-Type", mime::content_type_for(&file_path))
        .header("Vary", "Accept-Encoding");

    let body = if req.accepts_gzip {
        builder = builder.header("Content-Encoding", "gzip");
        gzip(&window).unwrap_or_else(|e| {
            logger::log_error(&format!("{}: {e}", file_path.display()));
            Vec::new()
        })
    } else {
        window
    };

    http::response::finish(builder, StatusCode::OK, Bytes::from(body))
}

/// Map a request path to a file under `root`
///
/// Paths that escape the canonical root are treated as missing.
async fn resolve(root: &Path, default_document: &str, request_path: &str) -> Resolved {
    if request_path == "/" {
        return Resolved::DefaultDocument(root.join(default_document));
    }

    let Ok(decoded) = urlencoding::decode(request_path) else {
        return Resolved::NotFound;
    };
    let relative = decoded.trim_start_matches('/');
    let file_path = root.join(relative);

    // File not found is common (404), no need to log at warning level
    match fs::metadata(&file_path).await {
        Ok(m) if m.is_file() => {}
        _ => return Resolved::NotFound,
    }

    let (Ok(root_canonical), Ok(file_canonical)) =
        (fs::canonicalize(root).await, fs::canonicalize(&file_path).await)
    else {
        return Resolved::NotFound;
    };
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {request_path} -> {}",
            file_canonical.display()
        ));
        return Resolved::NotFound;
    }

    Resolved::File(file_path)
}

/// Compute `ETag` from content and `Last-Modified` from the file's mtime
async fn validation_metadata(state: &AppState, path: &Path) -> ValidationMetadata {
    let stat = fs::metadata(path).await.ok();
    let modified = stat.as_ref().and_then(|m| m.modified().ok());
    let last_modified = modified.map(cache::format_http_date);

    let cache_key = stat.as_ref().zip(modified).map(|(m, t)| (t, m.len()));
    if let (Some(etag_cache), Some((modified, len))) = (&state.etag_cache, cache_key) {
        if let Some(etag) = etag_cache.get(path, modified, len) {
            return ValidationMetadata {
                etag: Some(etag),
                last_modified,
            };
        }
    }

    let etag = fs::read(path).await.ok().map(|c| cache::generate_etag(&c));
    if let (Some(etag_cache), Some((modified, len)), Some(etag)) =
        (&state.etag_cache, cache_key, etag.as_ref())
    {
        etag_cache.insert(path, modified, len, etag.clone());
    }

    ValidationMetadata {
        etag,
        last_modified,
    }
}

/// Read the requested window into `buf`
///
/// On error `buf` keeps whatever was read before the failure.
async fn read_window(file: &mut File, range: RangeSpec, buf: &mut Vec<u8>) -> Result<(), ServeError> {
    if range.is_requested() {
        file.seek(SeekFrom::Start(range.start))
            .await
            .map_err(|source| ServeError::Seek {
                offset: range.start,
                source,
            })?;
    }

    match range.limit() {
        Some(n) => file.take(n).read_to_end(buf).await,
        None => file.read_to_end(buf).await,
    }
    .map(|_| ())
    .map_err(ServeError::Read)
}

/// Gzip a byte window; the encoder is always finished
fn gzip(data: &[u8]) -> Result<Vec<u8>, ServeError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(ServeError::Compress)?;
    encoder.finish().map_err(ServeError::Compress)
}
