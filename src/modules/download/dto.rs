use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDownloadRequest {
    #[serde(default, alias = "file_ids")]
    #[validate(length(min = 1))]
    pub file_ids: Vec<String>,
}

/// Form variant: `file_ids` carries a JSON-encoded array of ids.
#[derive(Debug, Deserialize)]
pub struct BulkDownloadForm {
    #[serde(default)]
    pub file_ids: Option<String>,
}

impl BulkDownloadForm {
    pub fn into_request(self) -> Result<BulkDownloadRequest, serde_json::Error> {
        let file_ids = match self.file_ids.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(raw) => serde_json::from_str(raw)?,
        };
        Ok(BulkDownloadRequest { file_ids })
    }
}
