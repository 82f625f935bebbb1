//! devserve: a small local HTTP server for front-end development.
//!
//! Serves static files with `ETag`/`Last-Modified` validation, optional gzip
//! and single byte windows, stores multipart uploads, and echoes WebSocket
//! messages.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
