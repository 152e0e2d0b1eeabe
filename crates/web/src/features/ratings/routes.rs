use axum::{
    Router,
    routing::{delete, get, post},
};

use super::handlers::{list_rated_events, rate_event, remove_rating, remove_rating_legacy};
use crate::state::AppState;

/// Mounted under `/users`
pub fn private_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:user_id/events/:event_id/rate/:rating",
            post(rate_event).delete(remove_rating_legacy),
        )
        .route("/:user_id/events/:event_id/rate", delete(remove_rating))
        .route("/:user_id/rates", get(list_rated_events))
}
