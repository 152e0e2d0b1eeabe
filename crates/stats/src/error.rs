use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Local;
use serde::Serialize;
use stats_client::dto::DATE_TIME_FORMAT;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub status: String,
    pub reason: String,
    pub message: String,
    pub timestamp: String,
}

impl IntoResponse for StatsError {
    fn into_response(self) -> Response {
        let (status_code, reason, message) = match &self {
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "Incorrectly made request.",
                msg.clone(),
            ),
            e => {
                tracing::error!("Stats storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred.",
                    "An internal error occurred".to_string(),
                )
            }
        };

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

impl From<JsonRejection> for StatsError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for StatsError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
