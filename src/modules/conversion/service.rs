use futures_util::{stream, StreamExt};
use std::path::PathBuf;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{BatchEntry, BatchResponse, ConversionResponse};
use super::error::{ConversionError, JobStepError};
use super::model::{Direction, JobStatus};
use crate::common::upload::{file_stem, safe_filename, UploadedFile};
use crate::state::AppState;

const PROGRESS_SAVED: u8 = 30;

/// Names derived from an accepted upload.
struct JobNames {
    source_name: String,
    stem: String,
    display_name: String,
}

pub struct ConversionService;

impl ConversionService {
    pub fn validate(upload: &UploadedFile, direction: Direction) -> Result<(), ConversionError> {
        if upload.file_name.trim().is_empty() {
            return Err(ConversionError::Validation("No file selected".to_string()));
        }

        let source = direction.source();
        if !source.matches(&upload.file_name) {
            return Err(ConversionError::Validation(format!(
                "File must be a .{} document",
                source.extension()
            )));
        }

        Ok(())
    }

    fn names(upload: &UploadedFile, direction: Direction) -> JobNames {
        let source_name = safe_filename(&upload.file_name, direction.source().extension());
        let stem = file_stem(&source_name).to_string();
        let display_name = format!("{}.{}", stem, direction.target().extension());
        JobNames {
            source_name,
            stem,
            display_name,
        }
    }

    /// Validate, create the job, then drive it to a terminal state. Returns
    /// only after the job is Completed or Failed.
    ///
    /// The job runs on its own task, so a caller that goes away mid-conversion
    /// does not leave it in Processing or leak the staged upload.
    pub async fn convert(
        state: &AppState,
        upload: UploadedFile,
        direction: Direction,
    ) -> Result<ConversionResponse, ConversionError> {
        Self::validate(&upload, direction)?;

        let names = Self::names(&upload, direction);
        let job_id = state
            .jobs
            .create(direction, &names.source_name, &names.display_name)
            .await;
        info!(job_id = %job_id, file = %names.source_name, direction = direction.as_str(), "conversion job accepted");

        let task_state = state.clone();
        let handle = tokio::spawn(async move {
            Self::drive_job(&task_state, job_id, upload, names, direction).await
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                let reason = format!("conversion task aborted: {}", e);
                error!(job_id = %job_id, reason = %reason, "conversion task did not finish");
                if let Err(store_err) = state.jobs.mark_failed(job_id, &reason).await {
                    warn!(job_id = %job_id, error = %store_err, "could not record failure");
                }
                Err(ConversionError::JobFailed {
                    file_id: job_id,
                    reason,
                })
            }
        }
    }

    async fn drive_job(
        state: &AppState,
        job_id: Uuid,
        upload: UploadedFile,
        names: JobNames,
        direction: Direction,
    ) -> Result<ConversionResponse, ConversionError> {
        let staged = state.storage.staged_path(job_id, &names.source_name);
        let outcome = Self::run_job(state, job_id, &upload, &names, direction).await;

        let result = match outcome {
            Ok(output) => match state
                .jobs
                .mark_completed(job_id, output, &names.display_name)
                .await
            {
                Ok(()) => {
                    info!(job_id = %job_id, display_name = %names.display_name, "conversion completed");
                    Ok(ConversionResponse {
                        file_id: job_id,
                        status: JobStatus::Completed,
                        display_name: names.display_name,
                    })
                }
                Err(e) => Err(ConversionError::JobFailed {
                    file_id: job_id,
                    reason: e.to_string(),
                }),
            },
            Err(e) => {
                let reason = e.to_string();
                error!(job_id = %job_id, reason = %reason, "conversion failed");
                if let Err(store_err) = state.jobs.mark_failed(job_id, &reason).await {
                    warn!(job_id = %job_id, error = %store_err, "could not record failure");
                }
                Err(ConversionError::JobFailed {
                    file_id: job_id,
                    reason,
                })
            }
        };

        state.storage.discard(&staged).await;
        result
    }

    async fn run_job(
        state: &AppState,
        job_id: Uuid,
        upload: &UploadedFile,
        names: &JobNames,
        direction: Direction,
    ) -> Result<PathBuf, JobStepError> {
        let staged = state
            .storage
            .stage(job_id, &names.source_name, &upload.data)
            .await?;
        state.jobs.update_progress(job_id, PROGRESS_SAVED).await?;

        let target = direction.target();
        let produced = state
            .converter
            .convert(&staged, &state.storage.work_dir(), target)
            .await?;

        match state
            .storage
            .promote(&produced, job_id, &names.stem, target)
            .await
        {
            Ok(stable) => Ok(stable),
            Err(e) => {
                state.storage.discard(&produced).await;
                Err(e.into())
            }
        }
    }

    /// Each input runs independently; entries come back in input order.
    /// `batch_concurrency` bounds how many inputs are in flight at once.
    pub async fn convert_batch(
        state: &AppState,
        uploads: Vec<UploadedFile>,
        direction: Direction,
    ) -> BatchResponse {
        let concurrency = state.config.batch_concurrency.max(1);
        info!(files = uploads.len(), concurrency, direction = direction.as_str(), "batch conversion started");

        let results = stream::iter(
            uploads
                .into_iter()
                .map(|upload| Self::batch_entry(state, upload, direction)),
        )
        .buffered(concurrency)
        .collect::<Vec<_>>()
        .await;

        BatchResponse { results }
    }

    async fn batch_entry(state: &AppState, upload: UploadedFile, direction: Direction) -> BatchEntry {
        let filename = upload.file_name.clone();

        match Self::convert(state, upload, direction).await {
            Ok(done) => BatchEntry::Converted {
                filename,
                file_id: done.file_id,
                status: done.status,
                display_name: done.display_name,
            },
            Err(ConversionError::Validation(error)) => BatchEntry::Rejected { filename, error },
            Err(ConversionError::JobFailed { file_id, reason }) => BatchEntry::Failed {
                filename,
                file_id,
                status: JobStatus::Failed,
                error: reason,
            },
        }
    }
}
