use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Local;
use serde::Serialize;
use std::fmt;
use storage::{dto::common::DATE_TIME_FORMAT, error::StorageError};
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Validation(ValidationErrors),
    BadRequest(String),
    Unauthorized,
    NotFound(String),
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub status: String,
    pub reason: String,
    pub message: String,
    pub timestamp: String,
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

const BAD_REQUEST_REASON: &str = "Incorrectly made request.";
const NOT_FOUND_REASON: &str = "The required object was not found.";
const CONFLICT_REASON: &str = "For the requested operation the conditions are not met.";
const INTEGRITY_REASON: &str = "Integrity constraint has been violated.";
const INTERNAL_REASON: &str = "An internal error occurred.";

impl WebError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Storage(StorageError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, NOT_FOUND_REASON, msg.clone())
            }
            Self::Storage(StorageError::Conflict(msg)) => {
                (StatusCode::CONFLICT, CONFLICT_REASON, msg.clone())
            }
            Self::Storage(StorageError::ConstraintViolation(msg)) => {
                (StatusCode::CONFLICT, INTEGRITY_REASON, msg.clone())
            }
            Self::Storage(StorageError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, BAD_REQUEST_REASON, msg.clone())
            }
            Self::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_REASON,
                    "An internal error occurred".to_string(),
                )
            }
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                BAD_REQUEST_REASON,
                validation_message(errors),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, BAD_REQUEST_REASON, msg.clone()),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication is required.",
                "Missing or invalid API key".to_string(),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, NOT_FOUND_REASON, msg.clone()),
        }
    }
}

fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                format!(
                    "Field: {}. Error: {}",
                    field,
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                )
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status_code, reason, message) = self.parts();

        if status_code.is_client_error() {
            tracing::debug!("{} {}: {}", status_code.as_u16(), reason, message);
        }

        let body = ApiError {
            status: status_code
                .canonical_reason()
                .unwrap_or("UNKNOWN")
                .to_uppercase()
                .replace(' ', "_"),
            reason: reason.to_string(),
            message,
            timestamp: Local::now().naive_local().format(DATE_TIME_FORMAT).to_string(),
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for WebError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for WebError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: WebError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_body() {
        let (status, body) =
            body_of(StorageError::Conflict("The category is not empty.".to_string()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "CONFLICT");
        assert_eq!(body["reason"], CONFLICT_REASON);
        assert_eq!(body["message"], "The category is not empty.");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_storage_error_mapping() {
        let (status, body) = body_of(StorageError::not_found("Event", 3).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "NOT_FOUND");
        assert_eq!(body["message"], "Event with id=3 was not found.");

        let (status, body) =
            body_of(StorageError::ConstraintViolation("Email already exists".to_string()).into())
                .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["reason"], INTEGRITY_REASON);

        let (status, body) = body_of(StorageError::InvalidInput("bad".to_string()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_database_detail_is_hidden() {
        let (status, body) = body_of(StorageError::Database(sqlx::Error::PoolTimedOut).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "INTERNAL_SERVER_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("pool"));
    }
}
