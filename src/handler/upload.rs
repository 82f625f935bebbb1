//! File upload module
//!
//! Accepts `multipart/form-data` with a `file` field and stores the part
//! unchanged in the uploads directory.

use crate::config::AppState;
use crate::http;
use crate::logger;
use futures_util::Stream;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use multer::{Constraints, Multipart, SizeLimit};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const FILE_FIELD: &str = "file";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Upload failures, each mapped to one status and client-facing message
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unable to parse form")]
    Parse(#[source] BoxError),
    #[error("Unable to retrieve file")]
    MissingFile,
    #[error("Unable to create uploads directory")]
    CreateDir(#[source] std::io::Error),
    #[error("Unable to create file")]
    CreateFile(#[source] std::io::Error),
    #[error("Unable to save file")]
    Save(#[source] std::io::Error),
}

impl UploadError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Parse(_) | Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::CreateDir(_) | Self::CreateFile(_) | Self::Save(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn parse(e: multer::Error) -> Self {
        Self::Parse(e.into())
    }
}

/// Handle `/upload`
pub async fn handle_upload<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let cors_origin = state.config.http.cors_origin.as_str();

    if req.method() == Method::OPTIONS {
        let builder = http::response::with_cors(Response::builder(), cors_origin);
        return http::response::finish(builder, StatusCode::OK, Bytes::new());
    }

    let content_type = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let result = save_upload(
        content_type.as_deref(),
        req.into_body().into_data_stream(),
        state.config.http.max_upload_size,
        &state.uploads_dir,
    )
    .await;

    match result {
        Ok(file_name) => http::build_json_response(
            StatusCode::OK,
            &serde_json::json!({
                "message": format!("File uploaded successfully: {file_name}")
            }),
            cors_origin,
        ),
        Err(e) => {
            logger::log_warning(&format!("Upload failed: {e}: {}", error_chain(&e)));
            http::build_json_response(
                e.status(),
                &serde_json::json!({ "error": e.to_string() }),
                cors_origin,
            )
        }
    }
}

/// Stream the form's `file` part into `uploads_dir`
///
/// The part is written chunk by chunk as it arrives, so its size is bounded
/// only by `max_size` (whole body, `0` for no limit). A part that fails
/// midway is removed. Returns the stored file name.
pub async fn save_upload<S, O, E>(
    content_type: Option<&str>,
    body: S,
    max_size: u64,
    uploads_dir: &Path,
) -> Result<String, UploadError>
where
    S: Stream<Item = Result<O, E>> + Send + 'static,
    O: Into<Bytes> + 'static,
    E: Into<BoxError> + 'static,
{
    let boundary = content_type
        .ok_or(multer::Error::NoMultipart)
        .and_then(multer::parse_boundary)
        .map_err(UploadError::parse)?;

    let mut size_limit = SizeLimit::new();
    if max_size > 0 {
        size_limit = size_limit.whole_stream(max_size);
    }
    let mut multipart =
        Multipart::with_constraints(body, boundary, Constraints::new().size_limit(size_limit));

    let mut field = loop {
        match multipart.next_field().await.map_err(UploadError::parse)? {
            Some(field) if field.name() == Some(FILE_FIELD) => break field,
            Some(_) => {}
            None => return Err(UploadError::MissingFile),
        }
    };
    let file_name = field
        .file_name()
        .and_then(base_name)
        .ok_or(UploadError::MissingFile)?;

    fs::create_dir_all(uploads_dir)
        .await
        .map_err(UploadError::CreateDir)?;

    let target = uploads_dir.join(&file_name);
    let mut dst = fs::File::create(&target)
        .await
        .map_err(UploadError::CreateFile)?;

    let mut written = 0u64;
    let copied: Result<(), UploadError> = async {
        while let Some(chunk) = field.chunk().await.map_err(UploadError::parse)? {
            dst.write_all(&chunk).await.map_err(UploadError::Save)?;
            written += u64::try_from(chunk.len()).unwrap_or(u64::MAX);
        }
        dst.flush().await.map_err(UploadError::Save)
    }
    .await;

    if let Err(e) = copied {
        drop(dst);
        if let Err(rm) = fs::remove_file(&target).await {
            logger::log_warning(&format!(
                "Failed to remove partial upload '{}': {rm}",
                target.display()
            ));
        }
        return Err(e);
    }

    logger::log_upload_saved(&file_name, written);
    Ok(file_name)
}

/// Strip any directory components a client put into the file name
fn base_name(file_name: &str) -> Option<String> {
    let name = file_name.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

fn error_chain(e: &UploadError) -> String {
    std::error::Error::source(e).map_or_else(|| "-".to_string(), ToString::to_string)
}
