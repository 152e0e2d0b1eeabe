use axum::{
    Router,
    routing::{get, patch},
};

use super::handlers::{
    create_event, get_public_event, get_user_event, list_user_events, search_admin_events,
    search_public_events, update_admin_event, update_user_event,
};
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(search_public_events))
        .route("/events/:event_id", get(get_public_event))
}

/// Mounted under `/users`
pub fn private_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id/events", get(list_user_events).post(create_event))
        .route(
            "/:user_id/events/:event_id",
            get(get_user_event).patch(update_user_event),
        )
}

/// Mounted under `/admin`
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(search_admin_events))
        .route("/events/:event_id", patch(update_admin_event))
}
