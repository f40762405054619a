use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/download/bulk", post(handler::download_bulk))
        .route("/download/{file_id}", get(handler::download_file))
}
