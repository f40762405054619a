//! Uniform access to the external document converters.
//!
//! Callers hand over an input path, an output directory and the format they
//! want; the gateway decides which mechanism handles that format pair, runs
//! it, and finds the produced artifact.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::modules::conversion::model::DocumentFormat;

pub mod command;
pub mod libreoffice;
pub mod locator;

pub use libreoffice::LibreOfficeGateway;
pub use locator::{CapabilityLocator, SofficeLocator};

#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("Conversion unavailable: {0}")]
    Unavailable(String),
    #[error("Conversion timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("Conversion failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ConverterGateway: Send + Sync {
    /// Convert `input` into `target`, writing into `output_dir`. Returns the
    /// path of the produced artifact, which is named after the input stem
    /// with the target extension.
    async fn convert(
        &self,
        input: &Path,
        output_dir: &Path,
        target: DocumentFormat,
    ) -> Result<PathBuf, ConverterError>;

    /// Where the external tool currently resolves to, if anywhere. Touches the
    /// filesystem, so async callers run it on the blocking pool.
    fn locate(&self) -> Option<PathBuf>;
}

/// Predictable artifact name for `input` converted to `target`.
pub fn expected_output(input: &Path, output_dir: &Path, target: DocumentFormat) -> Option<PathBuf> {
    let stem = input.file_stem()?.to_str()?;
    Some(output_dir.join(format!("{}.{}", stem, target.extension())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_output_swaps_extension() {
        let out = expected_output(
            Path::new("uploads/abc_report.final.docx"),
            Path::new("converted/.work"),
            DocumentFormat::Pdf,
        );
        assert_eq!(out, Some(PathBuf::from("converted/.work/abc_report.final.pdf")));
    }

    #[test]
    fn timeout_message_names_seconds() {
        let err = ConverterError::Timeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "Conversion timed out after 60s");
    }
}
