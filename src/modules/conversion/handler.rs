use crate::common::response::{ApiError, ApiSuccess, ErrorBody};
use crate::common::upload::{read_file_field, UploadedFile};
use crate::state::AppState;
use super::dto::*;
use super::error::ConversionError;
use super::model::Direction;
use super::service::ConversionService;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;
use uuid::Uuid;

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError(e.body_text(), e.status())
}

/// First `file` part of the form, if any.
async fn single_upload(multipart: &mut Multipart) -> Result<Option<UploadedFile>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if upload.is_none() && field.name() == Some("file") {
            let file = read_file_field(field)
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            upload = Some(file);
        }
    }

    Ok(upload)
}

async fn convert_single(state: AppState, mut multipart: Multipart, direction: Direction) -> Response {
    let upload = match single_upload(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return ApiError::bad_request("No file provided").into_response(),
        Err(e) => return e.into_response(),
    };

    match ConversionService::convert(&state, upload, direction).await {
        Ok(res) => ApiSuccess(res, StatusCode::OK).into_response(),
        Err(ConversionError::Validation(message)) => ApiError::bad_request(message).into_response(),
        Err(e @ ConversionError::JobFailed { .. }) => ApiError::internal(e.to_string()).into_response(),
    }
}

/// Convert a single DOCX document to PDF
#[utoipa::path(
    post,
    path = "/api/convert/docx-to-pdf",
    request_body(content = ConvertUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Converted", body = ConversionResponse),
        (status = 400, description = "Missing or wrong-type file", body = ErrorBody),
        (status = 500, description = "Conversion failed", body = ErrorBody)
    ),
    tag = "Conversion"
)]
pub async fn convert_docx_to_pdf(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    convert_single(state, multipart, Direction::DocxToPdf).await
}

/// Convert a single PDF document to DOCX
#[utoipa::path(
    post,
    path = "/api/convert/pdf-to-docx",
    request_body(content = ConvertUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Converted", body = ConversionResponse),
        (status = 400, description = "Missing or wrong-type file", body = ErrorBody),
        (status = 500, description = "Conversion failed", body = ErrorBody)
    ),
    tag = "Conversion"
)]
pub async fn convert_pdf_to_docx(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    convert_single(state, multipart, Direction::PdfToDocx).await
}

/// Convert several files in one request
#[utoipa::path(
    post,
    path = "/api/convert/batch",
    request_body(content = BatchUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Per-file results in submission order", body = BatchResponse),
        (status = 400, description = "No files or unknown direction", body = ErrorBody)
    ),
    tag = "Conversion"
)]
pub async fn convert_batch(State(state): State<AppState>, mut multipart: Multipart) -> impl IntoResponse {
    let mut uploads = Vec::new();
    let mut direction_field = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return multipart_error(e).into_response(),
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("files") => match read_file_field(field).await {
                Ok(file) => uploads.push(file),
                Err(e) => return ApiError::bad_request(e.to_string()).into_response(),
            },
            Some("direction") => match field.text().await {
                Ok(text) => direction_field = Some(text),
                Err(e) => return multipart_error(e).into_response(),
            },
            _ => {}
        }
    }

    if uploads.is_empty() {
        return ApiError::bad_request("No files provided").into_response();
    }

    let direction = match direction_field.as_deref().map(str::trim) {
        None | Some("") => Direction::default(),
        Some(raw) => match raw.parse::<Direction>() {
            Ok(direction) => direction,
            Err(message) => return ApiError::bad_request(message).into_response(),
        },
    };

    let response = ConversionService::convert_batch(&state, uploads, direction).await;
    info!(
        results = response.results.len(),
        converted = response.results.iter().filter(|r| matches!(r, BatchEntry::Converted { .. })).count(),
        "batch conversion finished"
    );

    ApiSuccess(response, StatusCode::OK).into_response()
}

/// Full job record
#[utoipa::path(
    get,
    path = "/api/status/{file_id}",
    params(
        ("file_id" = String, Path, description = "Job identifier")
    ),
    responses(
        (status = 200, description = "Job record", body = JobResponse),
        (status = 404, description = "Unknown job", body = ErrorBody)
    ),
    tag = "Conversion"
)]
pub async fn get_status(State(state): State<AppState>, Path(file_id): Path<String>) -> impl IntoResponse {
    let Ok(id) = Uuid::parse_str(&file_id) else {
        return ApiError::not_found("File not found").into_response();
    };

    match state.jobs.get(id).await {
        Some(job) => ApiSuccess(JobResponse::from(job), StatusCode::OK).into_response(),
        None => ApiError::not_found("File not found").into_response(),
    }
}
