use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use super::model::{ConversionJob, Direction, JobStatus};

/// Multipart body of the single-file endpoints.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ConvertUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Multipart body of the batch endpoint.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct BatchUpload {
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Vec<Vec<u8>>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub file_id: Uuid,
    pub status: JobStatus,
    pub display_name: String,
}

/// One entry per submitted file, in submission order.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum BatchEntry {
    Converted {
        filename: String,
        #[serde(rename = "fileId")]
        file_id: Uuid,
        status: JobStatus,
        #[serde(rename = "displayName")]
        display_name: String,
    },
    Failed {
        filename: String,
        #[serde(rename = "fileId")]
        file_id: Uuid,
        status: JobStatus,
        error: String,
    },
    /// Rejected before a job was created.
    Rejected { filename: String, error: String },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchResponse {
    pub results: Vec<BatchEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress: u8,
    pub direction: Direction,
    pub source_name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

impl From<ConversionJob> for JobResponse {
    fn from(job: ConversionJob) -> Self {
        Self {
            id: job.id,
            status: job.status(),
            progress: job.progress,
            direction: job.direction,
            output_location: job.output_location().map(|p| p.to_string_lossy().to_string()),
            failure_reason: job.failure_reason().map(str::to_string),
            source_name: job.source_name,
            display_name: job.display_name,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}
