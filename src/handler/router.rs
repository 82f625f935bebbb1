//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: extracts the request hints,
//! dispatches `/ws` and `/upload`, and routes every other path by method.

use crate::config::AppState;
use crate::handler::static_files::{self, FileRequest};
use crate::handler::{upload, websocket};
use crate::http::{self, RangeSpec};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

pub const WEBSOCKET_PATH: &str = "/ws";
pub const UPLOAD_PATH: &str = "/upload";

/// Request hints consumed by the file responder
#[derive(Debug, Default)]
pub struct RequestContext {
    pub accepts_gzip: bool,
    pub range: RangeSpec,
    pub if_none_match: Option<String>,
}

impl RequestContext {
    /// Extract `Accept-Encoding`, `Range` and `If-None-Match`
    pub fn from_headers(headers: &hyper::HeaderMap) -> Self {
        let header = |name: hyper::header::HeaderName| {
            headers.get(name).and_then(|v| v.to_str().ok())
        };

        Self {
            accepts_gzip: header(hyper::header::ACCEPT_ENCODING)
                .is_some_and(|v| v.contains("gzip")),
            range: http::parse_range_header(header(hyper::header::RANGE)),
            if_none_match: header(hyper::header::IF_NONE_MATCH).map(ToString::to_string),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );

    let response = if req.uri().path() == WEBSOCKET_PATH {
        websocket::handle_websocket(req)
    } else {
        dispatch(req, &state).await
    };

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or_default();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry);
    }

    Ok(response)
}

/// Route every non-WebSocket request
pub async fn dispatch<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    if req.uri().path() == UPLOAD_PATH {
        return upload::handle_upload(req, state).await;
    }

    let cors_origin = state.config.http.cors_origin.as_str();
    match *req.method() {
        Method::GET => {
            let ctx = RequestContext::from_headers(req.headers());
            let file_req = FileRequest {
                path: req.uri().path(),
                accepts_gzip: ctx.accepts_gzip,
                range: ctx.range,
                if_none_match: ctx.if_none_match.as_deref(),
            };
            static_files::serve_file(state, &file_req).await
        }
        Method::POST => acknowledge("POST method received", cors_origin),
        Method::PUT => acknowledge("PUT method received, resource replaced", cors_origin),
        Method::DELETE => acknowledge("DELETE method received, resource deleted", cors_origin),
        Method::HEAD => build_head_response(),
        _ => {
            logger::log_warning(&format!("Method not allowed: {}", req.method()));
            http::build_405_response(cors_origin)
        }
    }
}

/// Fixed acknowledgment for the stub methods
fn acknowledge(body: &'static str, cors_origin: &str) -> Response<Full<Bytes>> {
    http::build_text_response(StatusCode::OK, body, Some(cors_origin))
}

/// HEAD carries no CORS headers and no body
fn build_head_response() -> Response<Full<Bytes>> {
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html");
    http::response::finish(builder, StatusCode::OK, Bytes::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    fn state() -> (TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), b"<p>index</p>").unwrap();
        std::fs::write(dir.path().join("ten.bin"), b"abcdefghij").unwrap();
        let mut config = Config::default();
        config.files.root = dir.path().to_string_lossy().into_owned();
        config.files.uploads_dir = dir.path().join("uploads").to_string_lossy().into_owned();
        (dir, AppState::new(&config))
    }

    fn request(method: Method, path: &str) -> hyper::http::request::Builder {
        Request::builder().method(method).uri(path)
    }

    fn empty() -> Full<Bytes> {
        Full::new(Bytes::new())
    }

    async fn text(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_context_from_headers() {
        let req = Request::get("/")
            .header("Accept-Encoding", "deflate, gzip;q=0.8")
            .header("Range", "bytes=2-5")
            .header("If-None-Match", "\"abc\"")
            .body(())
            .unwrap();
        let ctx = RequestContext::from_headers(req.headers());
        assert!(ctx.accepts_gzip);
        assert_eq!(ctx.range, RangeSpec { start: 2, end: 5 });
        assert_eq!(ctx.if_none_match.as_deref(), Some("\"abc\""));
    }

    #[test]
    fn test_context_defaults() {
        let req = Request::get("/")
            .header("Accept-Encoding", "br")
            .header("Range", "lines=1-2")
            .body(())
            .unwrap();
        let ctx = RequestContext::from_headers(req.headers());
        assert!(!ctx.accepts_gzip);
        assert!(!ctx.range.is_requested());
        assert_eq!(ctx.if_none_match, None);
    }

    #[tokio::test]
    async fn test_get_routes_to_files() {
        let (_dir, state) = state();
        let req = request(Method::GET, "/ten.bin")
            .header("Range", "bytes=2-5")
            .body(empty())
            .unwrap();
        let resp = dispatch(req, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(text(resp).await, "cde");

        let req = request(Method::GET, "/").body(empty()).unwrap();
        assert_eq!(text(dispatch(req, &state).await).await, "<p>index</p>");
    }

    #[tokio::test]
    async fn test_stub_methods() {
        let (_dir, state) = state();
        for (method, expected) in [
            (Method::POST, "POST method received"),
            (Method::PUT, "PUT method received, resource replaced"),
            (Method::DELETE, "DELETE method received, resource deleted"),
        ] {
            let req = request(method, "/anything").body(empty()).unwrap();
            let resp = dispatch(req, &state).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(
                resp.headers()["Access-Control-Allow-Origin"],
                "http://127.0.0.1:5500"
            );
            assert_eq!(text(resp).await, expected);
        }
    }

    #[tokio::test]
    async fn test_head_has_no_body_and_no_cors() {
        let (_dir, state) = state();
        let req = request(Method::HEAD, "/ten.bin").body(empty()).unwrap();
        let resp = dispatch(req, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Content-Type"], "text/html");
        assert!(resp.headers().get("Access-Control-Allow-Origin").is_none());
        assert!(text(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        let (_dir, state) = state();
        for method in [Method::OPTIONS, Method::PATCH] {
            let req = request(method, "/").body(empty()).unwrap();
            let resp = dispatch(req, &state).await;
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(
                resp.headers()["Access-Control-Allow-Origin"],
                "http://127.0.0.1:5500"
            );
            assert_eq!(text(resp).await, "405 Method Not Allowed");
        }
    }

    #[tokio::test]
    async fn test_upload_path_ignores_method_routing() {
        let (_dir, state) = state();
        let req = request(Method::GET, UPLOAD_PATH).body(empty()).unwrap();
        let resp = dispatch(req, &state).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(resp).await, r#"{"error":"Unable to parse form"}"#);
    }
}
