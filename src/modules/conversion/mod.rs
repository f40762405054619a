use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;

pub mod dto;
pub mod error;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/convert/docx-to-pdf", post(handler::convert_docx_to_pdf))
        .route("/convert/pdf-to-docx", post(handler::convert_pdf_to_docx))
        .route("/convert/batch", post(handler::convert_batch))
        .route("/status/{file_id}", get(handler::get_status))
}
