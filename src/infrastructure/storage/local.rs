use anyhow::{anyhow, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::modules::conversion::model::DocumentFormat;

/// Filesystem layout for staged uploads, converted artifacts and archives.
///
/// `upload_dir/{job_id}_{file_name}`, `converted_dir/{job_id}_{stem}.{ext}`,
/// `converted_dir/{zip_id}_converted_files.zip`. Converters write into
/// `converted_dir/.work` before the artifact is moved to its final name.
#[derive(Clone, Debug)]
pub struct StorageService {
    pub upload_dir: PathBuf,
    pub converted_dir: PathBuf,
}

impl StorageService {
    pub async fn new(upload_dir: impl Into<PathBuf>, converted_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self {
            upload_dir: upload_dir.into(),
            converted_dir: converted_dir.into(),
        };

        for dir in [&storage.upload_dir, &storage.converted_dir, &storage.work_dir()] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| anyhow!("Failed to create directory {}: {}", dir.display(), e))?;
        }

        info!(
            upload_dir = %storage.upload_dir.display(),
            converted_dir = %storage.converted_dir.display(),
            "Storage directories ready"
        );
        Ok(storage)
    }

    pub fn work_dir(&self) -> PathBuf {
        self.converted_dir.join(".work")
    }

    pub fn staged_path(&self, job_id: Uuid, file_name: &str) -> PathBuf {
        self.upload_dir.join(format!("{}_{}", job_id, file_name))
    }

    pub fn artifact_path(&self, job_id: Uuid, stem: &str, format: DocumentFormat) -> PathBuf {
        self.converted_dir
            .join(format!("{}_{}.{}", job_id, stem, format.extension()))
    }

    pub fn archive_path(&self, zip_id: Uuid) -> PathBuf {
        self.converted_dir
            .join(format!("{}_converted_files.zip", zip_id))
    }

    pub async fn stage(&self, job_id: Uuid, file_name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.staged_path(job_id, file_name);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| anyhow!("Failed to save upload {}: {}", path.display(), e))?;
        Ok(path)
    }

    /// Move a freshly produced artifact to its stable, job-keyed location.
    pub async fn promote(
        &self,
        produced: &Path,
        job_id: Uuid,
        stem: &str,
        format: DocumentFormat,
    ) -> Result<PathBuf> {
        let destination = self.artifact_path(job_id, stem, format);
        tokio::fs::rename(produced, &destination)
            .await
            .map_err(|e| anyhow!("Failed to move converted file into place: {}", e))?;
        Ok(destination)
    }

    /// Remove a file, tolerating it already being gone.
    pub async fn discard(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove file"),
        }
    }
}
