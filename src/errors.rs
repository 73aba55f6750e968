use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("missing required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("service not configured: {0}")]
    NotConfigured(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::UnknownService(name) => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "unknown_service",
                format!("unknown service: {}", name),
            ),
            AppError::Validation { missing } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "missing_required_fields",
                format!("missing required fields: {}", missing.join(", ")),
            ),
            AppError::NotConfigured(name) => (
                StatusCode::CONFLICT,
                "invalid_request_error",
                "not_configured",
                format!("service '{}' has no stored configuration", name),
            ),
            AppError::Persistence(e) => {
                tracing::error!("persistence error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "persistence_failed",
                    "internal server error".to_string(),
                )
            }
            AppError::Crypto(e) => {
                tracing::error!("crypto error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "crypto_failed",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_every_missing_field() {
        let err = AppError::Validation {
            missing: vec!["api_key".into(), "api_secret".into()],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("api_key"));
        assert!(msg.contains("api_secret"));
    }
}
