//! Request handler module
//!
//! Responsible for request routing dispatch and business logic processing:
//! static files, uploads and the WebSocket echo.

pub mod router;
pub mod static_files;
pub mod upload;
pub mod websocket;

// Re-export main entry point
pub use router::handle_request;
