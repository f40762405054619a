//! Shared harness for router tests: temp storage, in-memory job store and a
//! fake converter, so no LibreOffice install is needed.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use converter_backend::app::create_app;
use converter_backend::config::settings::AppConfig;
use converter_backend::infrastructure::converter::{ConverterError, ConverterGateway};
use converter_backend::infrastructure::storage::local::StorageService;
use converter_backend::modules::conversion::model::DocumentFormat;
use converter_backend::modules::conversion::repository::JobStore;
use converter_backend::state::AppState;

pub const BOUNDARY: &str = "----converter-test-boundary";

/// Produces `{stem}.{ext}` with a recognisable body. Inputs whose name
/// contains "corrupt" fail like LibreOffice does on unreadable documents.
pub struct FakeConverter;

#[async_trait]
impl ConverterGateway for FakeConverter {
    async fn convert(
        &self,
        input: &Path,
        output_dir: &Path,
        target: DocumentFormat,
    ) -> Result<PathBuf, ConverterError> {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        if stem.contains("corrupt") {
            return Err(ConverterError::Failed("soffice exited with exit status: 1".into()));
        }

        let source = tokio::fs::read(input).await.unwrap();
        let mut body = format!("{}:", target.extension()).into_bytes();
        body.extend_from_slice(&source);

        let out = output_dir.join(format!("{}.{}", stem, target.extension()));
        tokio::fs::write(&out, body).await.unwrap();
        Ok(out)
    }

    fn locate(&self) -> Option<PathBuf> {
        Some(PathBuf::from("/opt/fake/soffice"))
    }
}

pub struct TestHarness {
    pub state: AppState,
    pub app: Router,
    _dir: TempDir,
}

impl TestHarness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let storage = StorageService::new(dir.path().join("uploads"), dir.path().join("converted"))
            .await
            .expect("failed to create storage");
        let state = AppState::new(
            AppConfig::default(),
            JobStore::new(),
            storage,
            Arc::new(FakeConverter),
        );
        let app = create_app(state.clone());

        Self {
            state,
            app,
            _dir: dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    /// `parts` are (field name, file name, bytes); `file name = None` sends a
    /// plain text field.
    pub async fn post_multipart(&self, uri: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Response<Body> {
        let request = Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, json: serde_json::Value) -> Response<Body> {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Submit one DOCX and return its file id.
    pub async fn convert_docx(&self, file_name: &str) -> String {
        let response = self
            .post_multipart(
                "/api/convert/docx-to-pdf",
                &[("file", Some(file_name), b"docx-bytes".as_slice())],
            )
            .await;
        let json = body_json(response).await;
        json["fileId"].as_str().expect("fileId").to_string()
    }
}

pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
            }
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("response is JSON")
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
