use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Docx,
    Pdf,
}

impl DocumentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pdf => "pdf",
        }
    }

    /// Case-insensitive match on the final extension of `file_name`.
    pub fn matches(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case(self.extension()))
            .unwrap_or(false)
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("docx") {
            Some(DocumentFormat::Docx)
        } else if ext.eq_ignore_ascii_case("pdf") {
            Some(DocumentFormat::Pdf)
        } else {
            None
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    DocxToPdf,
    PdfToDocx,
}

impl Direction {
    pub fn source(&self) -> DocumentFormat {
        match self {
            Direction::DocxToPdf => DocumentFormat::Docx,
            Direction::PdfToDocx => DocumentFormat::Pdf,
        }
    }

    pub fn target(&self) -> DocumentFormat {
        match self {
            Direction::DocxToPdf => DocumentFormat::Pdf,
            Direction::PdfToDocx => DocumentFormat::Docx,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::DocxToPdf => "docx-to-pdf",
            Direction::PdfToDocx => "pdf-to-docx",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "docx-to-pdf" => Ok(Direction::DocxToPdf),
            "pdf-to-docx" => Ok(Direction::PdfToDocx),
            other => Err(format!(
                "Unknown direction '{}': expected docx-to-pdf or pdf-to-docx",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

/// Status plus the data that only exists in that status. Keeping the output
/// location inside `Completed` makes "output iff completed" unrepresentable
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Processing,
    Completed { output_location: PathBuf },
    Failed { reason: String },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Processing => JobStatus::Processing,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub id: Uuid,
    pub direction: Direction,
    pub source_name: String,
    pub display_name: String,
    pub progress: u8,
    pub state: JobState,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl ConversionJob {
    pub fn new(id: Uuid, direction: Direction, source_name: String, display_name: String) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            direction,
            source_name,
            display_name,
            progress: 0,
            state: JobState::Processing,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn output_location(&self) -> Option<&PathBuf> {
        match &self.state {
            JobState::Completed { output_location } => Some(output_location),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_matching_ignores_case() {
        assert!(DocumentFormat::Docx.matches("Report.DOCX"));
        assert!(DocumentFormat::Pdf.matches("scan.final.pdf"));
        assert!(!DocumentFormat::Docx.matches("notes.txt"));
        assert!(!DocumentFormat::Pdf.matches("pdf"));
    }

    #[test]
    fn direction_parses_wire_names() {
        assert_eq!("docx-to-pdf".parse::<Direction>(), Ok(Direction::DocxToPdf));
        assert_eq!("pdf-to-docx".parse::<Direction>(), Ok(Direction::PdfToDocx));
        assert!("docx-to-txt".parse::<Direction>().is_err());
        assert_eq!(Direction::PdfToDocx.target(), DocumentFormat::Docx);
    }

    #[test]
    fn new_job_starts_processing_without_output() {
        let job = ConversionJob::new(
            Uuid::new_v4(),
            Direction::DocxToPdf,
            "a.docx".into(),
            "a.pdf".into(),
        );
        assert_eq!(job.status(), JobStatus::Processing);
        assert_eq!(job.progress, 0);
        assert!(job.output_location().is_none());
        assert!(job.failure_reason().is_none());
    }
}
