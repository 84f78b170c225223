use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

/// HTTP-facing error surface (spec.md §7 propagation policy). Every
/// `AppError` the retrieval/ingestion crates raise maps onto exactly one of
/// these, which in turn maps onto the status codes spec.md §6 names for
/// each endpoint.
#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("internal server error")]
    Internal(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("payload too large")]
    TooLarge { limit_bytes: u64 },
    #[error("unsupported media type: {0}")]
    UnsupportedMime(String),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => Self::BadRequest(msg),
            AppError::EmptyPayload => Self::BadRequest("empty payload".to_string()),
            AppError::UnsupportedMime(mime) => Self::UnsupportedMime(mime),
            AppError::TooLarge { limit_bytes } => Self::TooLarge { limit_bytes },
            AppError::NotFound(msg) => Self::NotFound(msg),
            AppError::Conflict(msg) => Self::Conflict(msg),
            AppError::UnknownProfile(msg) => Self::Unprocessable(format!("unknown profile: {msg}")),
            AppError::UnknownDomain(msg) => Self::Unprocessable(format!("unknown domain: {msg}")),
            AppError::DeadlineExceeded => Self::DeadlineExceeded,
            other => {
                tracing::error!(error = %other, "internal error");
                Self::Internal("internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            Self::TooLarge { limit_bytes } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "too_large",
                format!("payload exceeds maximum size of {limit_bytes} bytes"),
            ),
            Self::UnsupportedMime(mime) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_mime",
                mime.clone(),
            ),
            Self::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable", msg.clone()),
            Self::DeadlineExceeded => (
                StatusCode::GATEWAY_TIMEOUT,
                "deadline_exceeded",
                "deadline exceeded".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error: code.to_string(), message })).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    message: String,
}
