use thiserror::Error;
use uuid::Uuid;

use super::repository::JobStoreError;
use crate::infrastructure::converter::ConverterError;

/// What a submission can end in besides success.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Rejected before a job existed.
    #[error("{0}")]
    Validation(String),
    /// The job was created and has been marked failed.
    #[error("{reason}")]
    JobFailed { file_id: Uuid, reason: String },
}

/// Failure of one step after the job was created.
#[derive(Debug, Error)]
pub(crate) enum JobStepError {
    #[error(transparent)]
    Converter(#[from] ConverterError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
    #[error(transparent)]
    Store(#[from] JobStoreError),
}
