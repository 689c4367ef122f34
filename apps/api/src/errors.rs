use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Provider failures and malformed model output are distinct variants so callers
/// can tell "the provider did not answer" apart from "the provider answered garbage".
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Document could not be read: {0}")]
    DocumentRead(String),

    #[error("Provider {provider} is unavailable: {detail}")]
    ProviderUnavailable { provider: String, detail: String },

    #[error("Provider {provider} timed out")]
    ProviderTimeout { provider: String },

    #[error("Provider {provider} rejected our credentials: {detail}")]
    ProviderAuthFailure { provider: String, detail: String },

    #[error("Malformed output from {provider}: {detail}")]
    MalformedModelOutput { provider: String, detail: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Maps a provider call failure onto the public error taxonomy.
    pub fn from_llm(provider: &str, err: LlmError) -> Self {
        let provider = provider.to_string();
        match err {
            LlmError::Timeout => AppError::ProviderTimeout { provider },
            LlmError::Auth { status, message } => AppError::ProviderAuthFailure {
                provider,
                detail: format!("status {status}: {message}"),
            },
            LlmError::EmptyContent => AppError::MalformedModelOutput {
                provider,
                detail: err.to_string(),
            },
            LlmError::Http(_)
            | LlmError::Api { .. }
            | LlmError::RateLimited { .. }
            | LlmError::Envelope(_) => AppError::ProviderUnavailable {
                provider,
                detail: err.to_string(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::DocumentRead(_) | AppError::MalformedModelOutput { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::ProviderAuthFailure { .. } => StatusCode::BAD_GATEWAY,
            AppError::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedMediaType(msg) => ("UNSUPPORTED_MEDIA_TYPE", msg.clone()),
            AppError::DocumentRead(msg) => ("DOCUMENT_READ_ERROR", msg.clone()),
            AppError::MalformedModelOutput { provider, detail } => {
                tracing::warn!(provider = %provider, "Malformed model output: {detail}");
                (
                    "MALFORMED_MODEL_OUTPUT",
                    format!("Failed to parse the response from {provider}"),
                )
            }
            AppError::ProviderAuthFailure { provider, detail } => {
                tracing::error!(provider = %provider, "Provider auth failure: {detail}");
                (
                    "PROVIDER_AUTH_FAILURE",
                    format!("{provider} rejected the configured credentials"),
                )
            }
            AppError::ProviderUnavailable { provider, detail } => {
                tracing::error!(provider = %provider, "Provider unavailable: {detail}");
                (
                    "PROVIDER_UNAVAILABLE",
                    format!("{provider} is currently unavailable"),
                )
            }
            AppError::ProviderTimeout { provider } => {
                tracing::error!(provider = %provider, "Provider request timed out");
                (
                    "PROVIDER_TIMEOUT",
                    format!("{provider} did not respond in time"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code
        }));

        (status, body).into_response()
    }
}
