//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use taskline_engine::Error as EngineError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, String, Option<String>) {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Engine(e) => engine_parts(e),
            AppError::BadRequest(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
        }
    }
}

fn engine_parts(e: &EngineError) -> (StatusCode, String, Option<String>) {
    match e {
        EngineError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string(), None),
        EngineError::InvalidContent(_) | EngineError::InvalidRequest(_) => {
            tracing::warn!("Rejected request: {}", e);
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string(), None)
        }
        EngineError::InvariantViolation(_) | EngineError::Store(_) => {
            tracing::error!("Engine error: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(e.to_string()),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = self.parts();

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_status() {
        let status = |e: EngineError| AppError::from(e).parts().0;

        assert_eq!(status(EngineError::NotFound("item x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(EngineError::InvalidContent("blank".into())), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status(EngineError::InvalidRequest("duplicate item id: a".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(EngineError::InvariantViolation("gap".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn client_errors_carry_message() {
        let (_, message, details) =
            AppError::from(EngineError::InvalidRequest("item ids must not be empty".into())).parts();
        assert_eq!(message, "invalid request: item ids must not be empty");
        assert!(details.is_none());
    }
}
