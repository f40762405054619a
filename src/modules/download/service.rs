use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::modules::conversion::model::JobStatus;
use crate::state::AppState;

pub const ARCHIVE_NAME: &str = "converted_files.zip";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("File not found")]
    NotFound,
    #[error("File not ready")]
    NotReady,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("No completed files found")]
    NoValidJobs,
    #[error("Failed to write archive: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// A finished artifact and the name it is offered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub display_name: String,
}

pub struct DownloadService;

impl DownloadService {
    pub async fn resolve(state: &AppState, job_id: Uuid) -> Result<Artifact, DownloadError> {
        let job = state.jobs.get(job_id).await.ok_or(DownloadError::NotFound)?;

        if job.status() != JobStatus::Completed {
            return Err(DownloadError::NotReady);
        }

        let path = job.output_location().cloned().ok_or(DownloadError::NotReady)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!(job_id = %job_id, path = %path.display(), "artifact missing from disk");
            return Err(DownloadError::NotFound);
        }

        Ok(Artifact {
            path,
            display_name: job.display_name,
        })
    }
}

pub struct ArchiveService;

impl ArchiveService {
    /// Bundle the artifacts of the given jobs, in the given order. Unknown,
    /// unfinished and missing-artifact jobs are skipped. Jobs sharing a display
    /// name collapse into one entry holding the later job's artifact.
    pub async fn assemble(state: &AppState, job_ids: &[Uuid]) -> Result<PathBuf, ArchiveError> {
        let mut entries: Vec<Artifact> = Vec::new();

        for &job_id in job_ids {
            let artifact = match DownloadService::resolve(state, job_id).await {
                Ok(artifact) => artifact,
                Err(e) => {
                    debug!(job_id = %job_id, reason = %e, "skipping job in archive");
                    continue;
                }
            };

            match entries
                .iter_mut()
                .find(|existing| existing.display_name == artifact.display_name)
            {
                Some(existing) => {
                    warn!(
                        display_name = %artifact.display_name,
                        job_id = %job_id,
                        "duplicate display name in archive, later job overwrites earlier"
                    );
                    existing.path = artifact.path;
                }
                None => entries.push(artifact),
            }
        }

        if entries.is_empty() {
            return Err(ArchiveError::NoValidJobs);
        }

        let archive_path = state.storage.archive_path(Uuid::new_v4());
        let target = archive_path.clone();
        let count = entries.len();

        tokio::task::spawn_blocking(move || write_archive(&target, &entries))
            .await
            .map_err(io::Error::other)??;

        info!(path = %archive_path.display(), entries = count, "archive assembled");
        Ok(archive_path)
    }
}

fn write_archive(path: &Path, entries: &[Artifact]) -> Result<(), ArchiveError> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        let mut source = match File::open(&entry.path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "artifact vanished before archiving");
                continue;
            }
        };
        zip.start_file(entry.display_name.as_str(), options)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}
