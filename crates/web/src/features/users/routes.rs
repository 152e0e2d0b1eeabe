use axum::{
    Router,
    routing::{delete, get},
};

use super::handlers::{create_user, delete_user, list_users};
use crate::state::AppState;

/// Mounted under `/admin`
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:user_id", delete(delete_user))
}
