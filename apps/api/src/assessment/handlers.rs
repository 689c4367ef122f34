//! Axum route handlers for the extraction API.

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::assessment::document::{read_document, DocumentKind};
use crate::assessment::extractor::extract_assessment;
use crate::errors::AppError;
use crate::state::AppState;

/// Text input, sent either form-encoded or as JSON.
#[derive(Debug, Deserialize)]
pub struct ExtractForm {
    pub content: String,
}

/// POST /extract/
///
/// Accepts a `content` form field, a JSON `{"content": ...}` body, or a multipart
/// upload (`content` text field or a `file` part). Returns the model's JSON verbatim.
#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn handle_extract(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<Value>, AppError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let content = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        read_multipart_content(multipart).await?
    } else if content_type.starts_with("application/json") {
        let Json(body) = Json::<ExtractForm>::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        body.content
    } else {
        let Form(form) = Form::<ExtractForm>::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        form.content
    };

    debug!(chars = content.len(), "Received extraction request");

    let extracted = extract_assessment(&content, state.provider.as_ref()).await?;
    Ok(Json(extracted))
}

/// Returns the text of the first `content` field or uploaded file in the form.
async fn read_multipart_content(mut multipart: Multipart) -> Result<String, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() || name == "file" {
            let file_name = field.file_name().map(String::from);
            let mime = field.content_type().map(String::from);
            let kind = DocumentKind::detect(file_name.as_deref(), mime.as_deref()).ok_or_else(
                || {
                    AppError::UnsupportedMediaType(format!(
                        "Unsupported document '{}' ({}); upload a PDF, DOCX or plain-text file",
                        file_name.as_deref().unwrap_or("unnamed"),
                        mime.as_deref().unwrap_or("unknown type")
                    ))
                },
            )?;

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
            debug!(bytes = data.len(), ?kind, "Document upload received");
            return read_document(kind, data).await;
        }

        if name == "content" {
            return field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read content: {e}")));
        }
    }

    Err(AppError::Validation(
        "Expected a `content` field or a `file` upload".to_string(),
    ))
}
