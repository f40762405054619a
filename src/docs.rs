use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::system::handler::health,
        crate::modules::conversion::handler::convert_docx_to_pdf,
        crate::modules::conversion::handler::convert_pdf_to_docx,
        crate::modules::conversion::handler::convert_batch,
        crate::modules::conversion::handler::get_status,
        crate::modules::download::handler::download_file,
        crate::modules::download::handler::download_bulk,
    ),
    components(
        schemas(
            crate::common::response::ErrorBody,
            crate::modules::system::dto::HealthResponse,
            crate::modules::conversion::dto::ConvertUpload,
            crate::modules::conversion::dto::BatchUpload,
            crate::modules::conversion::dto::ConversionResponse,
            crate::modules::conversion::dto::BatchEntry,
            crate::modules::conversion::dto::BatchResponse,
            crate::modules::conversion::dto::JobResponse,
            crate::modules::conversion::model::Direction,
            crate::modules::conversion::model::JobStatus,
            crate::modules::download::dto::BulkDownloadRequest,
        )
    ),
    tags(
        (name = "Conversion", description = "DOCX/PDF conversion jobs"),
        (name = "Download", description = "Converted file retrieval"),
        (name = "System", description = "Health and converter discovery")
    )
)]
pub struct ApiDoc;
