use axum::{
    Router,
    routing::{get, patch, post},
};

use super::handlers::{
    create_compilation, delete_compilation, get_compilation, list_compilations,
    update_compilation,
};
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/compilations", get(list_compilations))
        .route("/compilations/:comp_id", get(get_compilation))
}

/// Mounted under `/admin`
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/compilations", post(create_compilation))
        .route(
            "/compilations/:comp_id",
            patch(update_compilation).delete(delete_compilation),
        )
}
