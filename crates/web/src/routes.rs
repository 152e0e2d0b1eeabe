use axum::{Router, http::Uri, middleware};

use crate::error::WebError;
use crate::features::{categories, compilations, events, ratings, requests, users};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

/// Assemble the admin, private and public APIs into one router.
pub fn router(state: AppState, api_keys: ApiKeys) -> Router {
    let admin = Router::new()
        .merge(users::routes::admin_routes())
        .merge(categories::routes::admin_routes())
        .merge(events::routes::admin_routes())
        .merge(compilations::routes::admin_routes())
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    let private = Router::new()
        .merge(events::routes::private_routes())
        .merge(requests::routes::private_routes())
        .merge(ratings::routes::private_routes());

    let public = Router::new()
        .merge(categories::routes::public_routes())
        .merge(events::routes::public_routes())
        .merge(compilations::routes::public_routes());

    Router::new()
        .nest("/admin", admin)
        .nest("/users", private)
        .merge(public)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> WebError {
    WebError::NotFound(format!("No route for {}", uri.path()))
}
