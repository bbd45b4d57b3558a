use crate::AppState;
use crate::api::error::AppError;
use crate::models::{SummarizationResult, UploadResult};
use crate::services::document_service::DocumentError;
use crate::utils::validation::validate_pdf_upload;
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Multipart form accepted by `POST /documents`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentForm {
    /// PDF document (`pdfDoc` is accepted as field name too)
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    /// PEM encoded public key the summary is encrypted for
    #[validate(length(min = 1, message = "publicKeyPem is required"))]
    pub public_key_pem: String,

    /// Storage location returned by `POST /documents`
    #[serde(alias = "pdfDocName")]
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
}

const FILE_FIELDS: &[&str] = &["file", "pdfDoc"];

#[utoipa::path(
    post,
    path = "/documents",
    request_body(content = UploadDocumentForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document stored or found in the dedup cache", body = UploadResult),
        (status = 400, description = "Missing, unreadable or invalid document"),
        (status = 502, description = "Storage backend rejected the upload", body = UploadResult)
    ),
    tag = "documents"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResult>), AppError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if !FILE_FIELDS.contains(&name.as_str()) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("unnamed.pdf").to_string();
        let content_type = field.content_type().map(|s| s.to_string());

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                let err = DocumentError::Unreadable(e.body_text());
                tracing::warn!("Rejected upload of {}: {}", file_name, err);
                return Ok((StatusCode::BAD_REQUEST, Json(UploadResult::failure(err.to_string()))));
            }
        };

        validate_pdf_upload(
            &file_name,
            content_type.as_deref(),
            &data,
            state.config.max_file_size,
        )
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let result = state.documents.save_document(data, &file_name).await;
        let status = if result.success {
            StatusCode::OK
        } else {
            StatusCode::BAD_GATEWAY
        };
        return Ok((status, Json(result)));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

#[utoipa::path(
    post,
    path = "/documents/summary",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Summary produced", body = SummarizationResult),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "Summarization service failed", body = SummarizationResult),
        (status = 504, description = "Summarization service timed out", body = SummarizationResult)
    ),
    tag = "documents"
)]
pub async fn summarize_document(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Result<(StatusCode, Json<SummarizationResult>), AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let result = state
        .summarizer
        .summarize(&req.public_key_pem, &req.location)
        .await;

    let status = match (result.success, result.timed_out) {
        (true, _) => StatusCode::OK,
        (false, true) => StatusCode::GATEWAY_TIMEOUT,
        (false, false) => StatusCode::BAD_GATEWAY,
    };
    Ok((status, Json(result)))
}
