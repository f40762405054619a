use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

use super::command::{BoundedCommand, ProcessError};
use super::locator::CapabilityLocator;
use super::{expected_output, ConverterError, ConverterGateway};
use crate::modules::conversion::model::DocumentFormat;

const INSTALL_HINT: &str =
    "LibreOffice not found. Please install LibreOffice from https://www.libreoffice.org/download/";

/// Runs LibreOffice headless for both directions. DOCX→PDF goes through the
/// Writer PDF export filter; PDF→DOCX opens the input with the Writer PDF
/// import filter (`writer_pdf_import`) and saves as Word 2007 XML.
pub struct LibreOfficeGateway {
    locator: Arc<dyn CapabilityLocator>,
    timeout: Duration,
}

impl LibreOfficeGateway {
    pub fn new(locator: impl CapabilityLocator + 'static, timeout: Duration) -> Self {
        Self {
            locator: Arc::new(locator),
            timeout,
        }
    }

    async fn invoke(
        &self,
        program: &Path,
        profile_dir: &Path,
        filter_args: Vec<String>,
        input: &Path,
        output_dir: &Path,
        target: DocumentFormat,
    ) -> Result<(), ConverterError> {
        let profile = profile_url(profile_dir).await?;

        let mut cmd = BoundedCommand::new(program.to_path_buf(), self.timeout);
        cmd.arg(format!("-env:UserInstallation={}", profile))
            .arg("--headless")
            .args(filter_args)
            .arg("--outdir")
            .arg(output_dir.to_string_lossy())
            .arg(input.to_string_lossy());

        info!(program = %program.display(), input = %input.display(), target = %target, "invoking LibreOffice");

        match cmd.run().await {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => {
                error!(status = %output.status, stderr = %output.stderr, "LibreOffice conversion error");
                let detail = if output.stderr.is_empty() {
                    String::new()
                } else {
                    format!(": {}", output.stderr)
                };
                Err(ConverterError::Failed(format!(
                    "{} exited with {}{}",
                    cmd.program_name(),
                    output.status,
                    detail
                )))
            }
            Err(ProcessError::TimedOut { .. }) => Err(ConverterError::Timeout(self.timeout)),
            Err(e @ ProcessError::Spawn { .. }) => Err(ConverterError::Unavailable(e.to_string())),
            Err(e) => Err(ConverterError::Failed(e.to_string())),
        }
    }
}

/// Format-pair routing: the arguments that select import and export filters.
pub fn conversion_args(
    source: DocumentFormat,
    target: DocumentFormat,
) -> Result<Vec<String>, ConverterError> {
    match (source, target) {
        (DocumentFormat::Docx, DocumentFormat::Pdf) => Ok(vec![
            "--convert-to".to_string(),
            "pdf:writer_pdf_Export".to_string(),
        ]),
        (DocumentFormat::Pdf, DocumentFormat::Docx) => Ok(vec![
            "--infilter=writer_pdf_import".to_string(),
            "--convert-to".to_string(),
            "docx:MS Word 2007 XML".to_string(),
        ]),
        (s, t) => Err(ConverterError::Failed(format!(
            "unsupported conversion {} -> {}",
            s, t
        ))),
    }
}

async fn profile_url(profile_dir: &Path) -> Result<Url, ConverterError> {
    let absolute = tokio::fs::canonicalize(profile_dir)
        .await
        .map_err(|e| ConverterError::Failed(format!("cannot resolve profile directory: {}", e)))?;

    Url::from_directory_path(&absolute).map_err(|_| {
        ConverterError::Failed(format!(
            "profile directory is not a valid file URL: {}",
            absolute.display()
        ))
    })
}

#[async_trait]
impl ConverterGateway for LibreOfficeGateway {
    async fn convert(
        &self,
        input: &Path,
        output_dir: &Path,
        target: DocumentFormat,
    ) -> Result<PathBuf, ConverterError> {
        let locator = Arc::clone(&self.locator);
        let program = tokio::task::spawn_blocking(move || locator.locate())
            .await
            .map_err(|e| ConverterError::Failed(format!("converter lookup aborted: {}", e)))?
            .ok_or_else(|| ConverterError::Unavailable(INSTALL_HINT.to_string()))?;

        let source = DocumentFormat::from_path(input).ok_or_else(|| {
            ConverterError::Failed(format!("unrecognised input format: {}", input.display()))
        })?;
        let filter_args = conversion_args(source, target)?;

        let expected = expected_output(input, output_dir, target).ok_or_else(|| {
            ConverterError::Failed(format!("input has no usable file name: {}", input.display()))
        })?;

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| ConverterError::Failed(format!("cannot create output directory: {}", e)))?;

        // Private profile per run; concurrent soffice processes sharing one
        // profile block on its lock file.
        let profile_dir = output_dir.join(format!(".lo-profile-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&profile_dir)
            .await
            .map_err(|e| ConverterError::Failed(format!("cannot create profile directory: {}", e)))?;

        let result = self
            .invoke(&program, &profile_dir, filter_args, input, output_dir, target)
            .await;

        if let Err(e) = tokio::fs::remove_dir_all(&profile_dir).await {
            debug!(path = %profile_dir.display(), error = %e, "failed to remove LibreOffice profile");
        }

        result?;

        match tokio::fs::try_exists(&expected).await {
            Ok(true) => Ok(expected),
            _ => {
                error!(path = %expected.display(), "converted file not found");
                Err(ConverterError::Failed(format!(
                    "converter produced no output file {}",
                    expected
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default()
                )))
            }
        }
    }

    fn locate(&self) -> Option<PathBuf> {
        self.locator.locate()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::infrastructure::converter::SofficeLocator;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;

    const CONVERTING_SCRIPT: &str = r#"#!/bin/sh
prev=""
for arg in "$@"; do
  if [ "$prev" = "--outdir" ]; then out="$arg"; fi
  if [ "$prev" = "--convert-to" ]; then
    case "$arg" in
      pdf*) ext=pdf ;;
      docx*) ext=docx ;;
    esac
  fi
  prev="$arg"
  last="$arg"
done
name=$(basename "$last")
printf 'converted' > "$out/${name%.*}.$ext"
"#;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-soffice");
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn gateway(script: PathBuf, timeout: Duration) -> LibreOfficeGateway {
        LibreOfficeGateway::new(SofficeLocator::fixed(script), timeout)
    }

    fn input_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"source").unwrap();
        path
    }

    #[test]
    fn routes_each_direction_to_its_filters() {
        let docx_to_pdf = conversion_args(DocumentFormat::Docx, DocumentFormat::Pdf).unwrap();
        assert!(docx_to_pdf.contains(&"pdf:writer_pdf_Export".to_string()));
        assert!(!docx_to_pdf.iter().any(|a| a.starts_with("--infilter")));

        let pdf_to_docx = conversion_args(DocumentFormat::Pdf, DocumentFormat::Docx).unwrap();
        assert!(pdf_to_docx.contains(&"--infilter=writer_pdf_import".to_string()));
        assert!(pdf_to_docx.contains(&"docx:MS Word 2007 XML".to_string()));

        assert!(matches!(
            conversion_args(DocumentFormat::Pdf, DocumentFormat::Pdf),
            Err(ConverterError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let gw = gateway(dir.path().join("absent"), Duration::from_secs(5));
        let input = input_file(dir.path(), "a.docx");

        let err = gw.convert(&input, dir.path(), DocumentFormat::Pdf).await.unwrap_err();
        assert!(matches!(err, ConverterError::Unavailable(_)));
        assert!(gw.locate().is_none());
    }

    #[tokio::test]
    #[serial]
    async fn finds_artifact_by_stem_and_cleans_profile() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), CONVERTING_SCRIPT);
        let out_dir = dir.path().join("out");
        let input = input_file(dir.path(), "job1_report.docx");

        let produced = gateway(script, Duration::from_secs(10))
            .convert(&input, &out_dir, DocumentFormat::Pdf)
            .await
            .unwrap();

        assert_eq!(produced, out_dir.join("job1_report.pdf"));
        assert!(produced.is_file());

        let leftovers: Vec<_> = std::fs::read_dir(&out_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".lo-profile-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn pdf_input_produces_docx() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), CONVERTING_SCRIPT);
        let input = input_file(dir.path(), "scan.pdf");

        let produced = gateway(script, Duration::from_secs(10))
            .convert(&input, dir.path(), DocumentFormat::Docx)
            .await
            .unwrap();

        assert_eq!(produced, dir.path().join("scan.docx"));
    }

    #[tokio::test]
    #[serial]
    async fn nonzero_exit_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "#!/bin/sh\necho 'source file could not be loaded' >&2\nexit 1\n");
        let input = input_file(dir.path(), "a.docx");

        let err = gateway(script, Duration::from_secs(10))
            .convert(&input, dir.path(), DocumentFormat::Pdf)
            .await
            .unwrap_err();

        match err {
            ConverterError::Failed(reason) => assert!(reason.contains("could not be loaded"), "{reason}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    #[serial]
    async fn silent_success_without_output_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "#!/bin/sh\nexit 0\n");
        let input = input_file(dir.path(), "a.docx");

        let err = gateway(script, Duration::from_secs(10))
            .convert(&input, dir.path(), DocumentFormat::Pdf)
            .await
            .unwrap_err();

        match err {
            ConverterError::Failed(reason) => assert!(reason.contains("a.pdf"), "{reason}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    #[serial]
    async fn hung_converter_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "#!/bin/sh\nexec sleep 10\n");
        let input = input_file(dir.path(), "a.docx");

        let err = gateway(script, Duration::from_millis(300))
            .convert(&input, dir.path(), DocumentFormat::Pdf)
            .await
            .unwrap_err();

        assert!(matches!(err, ConverterError::Timeout(_)));
    }
}
