use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnforcementError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("not permitted")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for EnforcementError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, error) = match self {
            EnforcementError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }
            // Permission and tenant denials share one generic message so
            // responses never leak whether a foreign resource exists.
            EnforcementError::Forbidden => (StatusCode::FORBIDDEN, "Not permitted".to_string()),
            EnforcementError::NotFound(what) => (StatusCode::NOT_FOUND, what),
            EnforcementError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
            EnforcementError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            EnforcementError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            EnforcementError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
