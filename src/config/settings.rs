use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use crate::config::env::{self, EnvKey};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub upload_dir: PathBuf,
    pub converted_dir: PathBuf,
    pub soffice_path: Option<PathBuf>,
    pub conversion_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub batch_concurrency: usize,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            server_host: env::get_or(EnvKey::ServerHost, "0.0.0.0"),
            server_port: env::get_parsed(EnvKey::ServerPort, 5001),
            upload_dir: PathBuf::from(env::get_or(EnvKey::UploadDir, "uploads")),
            converted_dir: PathBuf::from(env::get_or(EnvKey::ConvertedDir, "converted")),
            soffice_path: env::get(EnvKey::SofficePath)
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            conversion_timeout_secs: env::get_parsed(EnvKey::ConversionTimeoutSecs, DEFAULT_TIMEOUT_SECS),
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, DEFAULT_MAX_UPLOAD_BYTES),
            batch_concurrency: env::get_parsed(EnvKey::BatchConcurrency, 1usize).max(1),
        }
    }

    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.conversion_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 5001,
            upload_dir: PathBuf::from("uploads"),
            converted_dir: PathBuf::from("converted"),
            soffice_path: None,
            conversion_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            batch_concurrency: 1,
        }
    }
}
