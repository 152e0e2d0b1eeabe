use axum::{
    Router,
    routing::{get, patch, post},
};

use super::handlers::{
    create_category, delete_category, get_category, list_categories, update_category,
};
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/:cat_id", get(get_category))
}

/// Mounted under `/admin`
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category))
        .route("/categories/:cat_id", patch(update_category).delete(delete_category))
}
