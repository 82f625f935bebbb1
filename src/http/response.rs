//! HTTP response building module
//!
//! Provides builders for the fixed responses shared by the handlers.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

pub const NOT_FOUND_BODY: &str = "404 Not Found";
pub const METHOD_NOT_ALLOWED_BODY: &str = "405 Method Not Allowed";

const CORS_ALLOW_METHODS: &str = "POST, GET, OPTIONS, PUT, DELETE";
const CORS_ALLOW_HEADERS: &str = "Content-Type";

/// Attach the CORS headers used by file, stub and upload responses
pub fn with_cors(builder: Builder, origin: &str) -> Builder {
    builder
        .header("Access-Control-Allow-Origin", origin)
        .header("Access-Control-Allow-Methods", CORS_ALLOW_METHODS)
        .header("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS)
}

/// Finish a builder, falling back to an empty response of the same status
pub fn finish(builder: Builder, status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        let mut resp = Response::new(Full::new(Bytes::new()));
        *resp.status_mut() = status;
        resp
    })
}

/// Build a plain-text response
pub fn build_text_response(
    status: StatusCode,
    body: &'static str,
    cors_origin: Option<&str>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8");
    if let Some(origin) = cors_origin {
        builder = with_cors(builder, origin);
    }
    finish(builder, status, Bytes::from_static(body.as_bytes()))
}

/// Build 404 Not Found response
pub fn build_404_response(cors_origin: &str) -> Response<Full<Bytes>> {
    build_text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY, Some(cors_origin))
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(cors_origin: &str) -> Response<Full<Bytes>> {
    build_text_response(
        StatusCode::METHOD_NOT_ALLOWED,
        METHOD_NOT_ALLOWED_BODY,
        Some(cors_origin),
    )
}

/// Build a JSON response carrying CORS headers
pub fn build_json_response(
    status: StatusCode,
    value: &serde_json::Value,
    cors_origin: &str,
) -> Response<Full<Bytes>> {
    let builder = with_cors(
        Response::builder()
            .status(status)
            .header("Content-Type", "application/json"),
        cors_origin,
    );
    finish(builder, status, Bytes::from(value.to_string()))
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
