use anyhow::{anyhow, Result};
use axum::{body::Bytes, extract::multipart::Field};
use bytes::BytesMut;
use futures_util::StreamExt;
use tracing::error;

/// A file part pulled out of a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

pub async fn read_file_field(mut field: Field<'_>) -> Result<UploadedFile> {
    let file_name = field.file_name().unwrap_or("").to_string();
    let mut buffer = BytesMut::new();

    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| {
            error!("Stream error while reading {}: {}", file_name, e);
            anyhow!("Stream interrupted")
        })?;
        buffer.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        file_name,
        data: buffer.freeze(),
    })
}

/// Reduce a client-supplied filename to something safe to embed in a path:
/// ASCII letters, digits, `.`, `_` and `-` only, whitespace turned into `_`,
/// no directory components and no leading dots or underscores.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    cleaned.trim_start_matches(['.', '_']).to_string()
}

/// Sanitised name, falling back to `document.{ext}` when nothing survives or
/// only the extension is left.
pub fn safe_filename(name: &str, ext: &str) -> String {
    let cleaned = sanitize_filename(name);
    match cleaned.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => cleaned,
        _ => format!("document.{}", ext),
    }
}

/// Stem of a sanitised filename (everything before the last `.`).
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories_and_unsafe_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(r"C:\Users\me\Quarterly Report.docx"), "Quarterly_Report.docx");
        assert_eq!(sanitize_filename("my  résumé (final).docx"), "my_rsum_final.docx");
        assert_eq!(sanitize_filename("..hidden.pdf"), "hidden.pdf");
    }

    #[test]
    fn falls_back_when_nothing_usable_remains() {
        assert_eq!(safe_filename("отчёт.docx", "docx"), "document.docx");
        assert_eq!(safe_filename("", "pdf"), "document.pdf");
        assert_eq!(safe_filename("report.docx", "docx"), "report.docx");
    }

    #[test]
    fn stem_drops_last_extension_only() {
        assert_eq!(file_stem("archive.v2.docx"), "archive.v2");
        assert_eq!(file_stem("report.pdf"), "report");
        assert_eq!(file_stem("noext"), "noext");
    }
}
