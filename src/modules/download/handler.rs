use crate::common::response::{ApiError, ErrorBody};
use crate::state::AppState;
use super::dto::{BulkDownloadForm, BulkDownloadRequest};
use super::service::{ArchiveError, ArchiveService, DownloadError, DownloadService, ARCHIVE_NAME};
use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use axum_extra::response::Attachment;
use std::path::Path as FsPath;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{error, warn};
use uuid::Uuid;
use validator::Validate;

fn attachment(file: File, file_name: &str, content_type: &str) -> Response {
    let body = Body::from_stream(ReaderStream::new(file));

    Attachment::new(body)
        .filename(file_name)
        .content_type(content_type)
        .into_response()
}

async fn stream_file(path: &FsPath, file_name: &str, content_type: &str) -> Response {
    match File::open(path).await {
        Ok(file) => attachment(file, file_name, content_type),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to open file for download");
            ApiError::not_found("File not found").into_response()
        }
    }
}

/// Archives are single-use. The path is unlinked once opened; the open handle
/// keeps the bytes readable until the body has been streamed.
async fn stream_archive(path: &FsPath) -> Response {
    let opened = File::open(path).await;

    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "failed to remove transient archive");
    }

    match opened {
        Ok(file) => attachment(file, ARCHIVE_NAME, "application/zip"),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to open archive for download");
            ApiError::internal("Failed to read archive").into_response()
        }
    }
}

/// Download one converted file under its display name
#[utoipa::path(
    get,
    path = "/api/download/{file_id}",
    params(
        ("file_id" = String, Path, description = "Job identifier")
    ),
    responses(
        (status = 200, description = "Converted file, served as an attachment"),
        (status = 400, description = "Job not completed", body = ErrorBody),
        (status = 404, description = "Unknown job or missing file", body = ErrorBody)
    ),
    tag = "Download"
)]
pub async fn download_file(State(state): State<AppState>, Path(file_id): Path<String>) -> impl IntoResponse {
    let Ok(id) = Uuid::parse_str(&file_id) else {
        return ApiError::not_found("File not found").into_response();
    };

    match DownloadService::resolve(&state, id).await {
        Ok(artifact) => {
            let content_type = mime_guess::from_path(&artifact.display_name)
                .first_or_octet_stream()
                .to_string();
            stream_file(&artifact.path, &artifact.display_name, &content_type).await
        }
        Err(e @ DownloadError::NotFound) => ApiError::not_found(e.to_string()).into_response(),
        Err(e @ DownloadError::NotReady) => ApiError::bad_request(e.to_string()).into_response(),
    }
}

async fn bulk_request(state: &AppState, request: Request) -> Result<BulkDownloadRequest, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<mime::Mime>().ok());

    match content_type {
        Some(ct) if ct.subtype() == mime::JSON || ct.suffix() == Some(mime::JSON) => {
            let Json(body) = Json::<BulkDownloadRequest>::from_request(request, state)
                .await
                .map_err(|e| ApiError(e.body_text(), e.status()))?;
            Ok(body)
        }
        Some(ct) if ct.essence_str() == mime::MULTIPART_FORM_DATA.essence_str() => {
            let mut multipart = Multipart::from_request(request, state)
                .await
                .map_err(|e| ApiError(e.body_text(), e.status()))?;

            let mut form = BulkDownloadForm { file_ids: None };
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| ApiError(e.body_text(), e.status()))?
            {
                if field.name() == Some("file_ids") {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError(e.body_text(), e.status()))?;
                    form.file_ids = Some(text);
                }
            }

            form.into_request()
                .map_err(|e| ApiError::bad_request(format!("file_ids must be a JSON array: {}", e)))
        }
        _ => {
            let Form(form) = Form::<BulkDownloadForm>::from_request(request, state)
                .await
                .map_err(|e| ApiError(e.body_text(), e.status()))?;

            form.into_request()
                .map_err(|e| ApiError::bad_request(format!("file_ids must be a JSON array: {}", e)))
        }
    }
}

/// Download several converted files as one ZIP archive
#[utoipa::path(
    post,
    path = "/api/download/bulk",
    request_body(content = BulkDownloadRequest, description = "JSON body, or form field `file_ids` holding a JSON array"),
    responses(
        (status = 200, description = "converted_files.zip attachment"),
        (status = 400, description = "No ids given", body = ErrorBody),
        (status = 404, description = "None of the ids resolved to a completed file", body = ErrorBody)
    ),
    tag = "Download"
)]
pub async fn download_bulk(State(state): State<AppState>, request: Request) -> impl IntoResponse {
    let req = match bulk_request(&state, request).await {
        Ok(req) => req,
        Err(e) => return e.into_response(),
    };

    if req.validate().is_err() {
        return ApiError::bad_request("No files specified").into_response();
    }

    // Malformed ids can never match a job; treat them like unknown ones.
    let ids: Vec<Uuid> = req
        .file_ids
        .iter()
        .filter_map(|raw| Uuid::parse_str(raw.trim()).ok())
        .collect();

    match ArchiveService::assemble(&state, &ids).await {
        Ok(path) => stream_archive(&path).await,
        Err(e @ ArchiveError::NoValidJobs) => ApiError::not_found(e.to_string()).into_response(),
        Err(e) => {
            error!(error = %e, "bulk download failed");
            ApiError::internal(e.to_string()).into_response()
        }
    }
}
