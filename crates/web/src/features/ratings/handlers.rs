use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::event::{EventFullDto, EventShortDto},
};

use crate::error::{ApiError, WebError};
use crate::extract::AppPath;

use super::services;

#[utoipa::path(
    post,
    path = "/users/{user_id}/events/{event_id}/rate/{rating}",
    params(
        ("user_id" = i64, Path, description = "Rating user id"),
        ("event_id" = i64, Path, description = "Event id"),
        ("rating" = i32, Path, description = "Rating from 1 to 5")
    ),
    responses(
        (status = 201, description = "Rating stored", body = EventFullDto),
        (status = 400, description = "Rating out of range", body = ApiError),
        (status = 404, description = "User or event not found", body = ApiError),
        (status = 409, description = "User has no confirmed request for the event", body = ApiError)
    ),
    tag = "ratings"
)]
pub async fn rate_event(
    State(db): State<Database>,
    AppPath((user_id, event_id, rating)): AppPath<(i64, i64, String)>,
) -> Result<Response, WebError> {
    let value: i32 = rating
        .parse()
        .map_err(|_| WebError::BadRequest(format!("Rating must be a number, got '{}'", rating)))?;

    let event = services::rate_event(db.pool(), user_id, event_id, value).await?;

    Ok((StatusCode::CREATED, Json(event)).into_response())
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}/events/{event_id}/rate",
    params(
        ("user_id" = i64, Path, description = "Rating user id"),
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 204, description = "Rating removed"),
        (status = 404, description = "Rating not found", body = ApiError)
    ),
    tag = "ratings"
)]
pub async fn remove_rating(
    State(db): State<Database>,
    AppPath((user_id, event_id)): AppPath<(i64, i64)>,
) -> Result<Response, WebError> {
    services::remove_rating(db.pool(), user_id, event_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `DELETE .../rate/delete`, kept for older clients
pub async fn remove_rating_legacy(
    State(db): State<Database>,
    AppPath((user_id, event_id, segment)): AppPath<(i64, i64, String)>,
) -> Result<Response, WebError> {
    if segment != "delete" {
        return Err(WebError::NotFound(format!(
            "Unknown rating action '{}'",
            segment
        )));
    }

    services::remove_rating(db.pool(), user_id, event_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/rates",
    params(
        ("user_id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Events rated by the user", body = Vec<EventShortDto>),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "ratings"
)]
pub async fn list_rated_events(
    State(db): State<Database>,
    AppPath(user_id): AppPath<i64>,
) -> Result<Response, WebError> {
    let events = services::list_rated_events(db.pool(), user_id).await?;

    Ok(Json(events).into_response())
}
