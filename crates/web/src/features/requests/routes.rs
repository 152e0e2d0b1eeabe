use axum::{
    Router,
    routing::{get, patch},
};

use super::handlers::{
    cancel_request, create_request, list_event_requests, list_user_requests,
    update_request_statuses,
};
use crate::state::AppState;

/// Mounted under `/users`
pub fn private_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id/requests", get(list_user_requests).post(create_request))
        .route("/:user_id/requests/:request_id/cancel", patch(cancel_request))
        .route(
            "/:user_id/events/:event_id/requests",
            get(list_event_requests).patch(update_request_statuses),
        )
}
