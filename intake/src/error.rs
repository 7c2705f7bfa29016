use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Ownership error: {0}")]
    Ownership(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Blob store error: {0}")]
    BlobStore(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            IntakeError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            IntakeError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            IntakeError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            IntakeError::Ownership(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            IntakeError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            IntakeError::Database(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            IntakeError::Processing(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            IntakeError::BlobStore(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            IntakeError::Http(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            IntakeError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            IntakeError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            IntakeError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            IntakeError::Ocr(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            IntakeError::OcrUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            IntakeError::Transcription(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            IntakeError::TranscriptionUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            IntakeError::Llm(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            IntakeError::LlmUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            IntakeError::LlmRateLimit { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("LLM rate limit exceeded, retry after {retry_after:?} seconds"),
            ),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, IntakeError>;
