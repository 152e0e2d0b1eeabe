use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use stats_client::StatsClient;
use storage::{
    Database,
    dto::{
        common::PaginationParams,
        event::{
            AdminEventFilter, EventFullDto, EventShortDto, NewEventRequest, PublicEventFilter,
            UpdateEventAdminRequest, UpdateEventUserRequest,
        },
    },
};
use validator::Validate;

use crate::clock;
use crate::error::{ApiError, WebError};
use crate::extract::{AppJson, AppPath, AppQuery, ClientIp};

use super::services;

#[utoipa::path(
    post,
    path = "/users/{user_id}/events",
    params(
        ("user_id" = i64, Path, description = "Initiator id")
    ),
    request_body = NewEventRequest,
    responses(
        (status = 201, description = "Event created in PENDING state", body = EventFullDto),
        (status = 400, description = "Validation error or event date too soon", body = ApiError),
        (status = 404, description = "User or category not found", body = ApiError)
    ),
    tag = "events"
)]
pub async fn create_event(
    State(db): State<Database>,
    AppPath(user_id): AppPath<i64>,
    AppJson(req): AppJson<NewEventRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let view = services::create_event(db.pool(), user_id, &req, clock::now()).await?;

    Ok((StatusCode::CREATED, Json(EventFullDto::from(view))).into_response())
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/events",
    params(
        ("user_id" = i64, Path, description = "Initiator id"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Events created by the user", body = Vec<EventShortDto>),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "events"
)]
pub async fn list_user_events(
    State(db): State<Database>,
    AppPath(user_id): AppPath<i64>,
    AppQuery(page): AppQuery<PaginationParams>,
) -> Result<Response, WebError> {
    page.validate().map_err(WebError::BadRequest)?;

    let views = services::list_user_events(db.pool(), user_id, &page).await?;

    let response: Vec<EventShortDto> = views.into_iter().map(EventShortDto::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/events/{event_id}",
    params(
        ("user_id" = i64, Path, description = "Initiator id"),
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Event found", body = EventFullDto),
        (status = 404, description = "User or event not found", body = ApiError),
        (status = 409, description = "User is not the initiator", body = ApiError)
    ),
    tag = "events"
)]
pub async fn get_user_event(
    State(db): State<Database>,
    AppPath((user_id, event_id)): AppPath<(i64, i64)>,
) -> Result<Response, WebError> {
    let (view, my_rating) = services::get_user_event(db.pool(), user_id, event_id).await?;

    Ok(Json(EventFullDto::from(view).with_my_rating(my_rating)).into_response())
}

#[utoipa::path(
    patch,
    path = "/users/{user_id}/events/{event_id}",
    params(
        ("user_id" = i64, Path, description = "Initiator id"),
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = UpdateEventUserRequest,
    responses(
        (status = 200, description = "Event updated", body = EventFullDto),
        (status = 400, description = "Validation error or event date too soon", body = ApiError),
        (status = 404, description = "User, event or category not found", body = ApiError),
        (status = 409, description = "Event is published or user is not the initiator", body = ApiError)
    ),
    tag = "events"
)]
pub async fn update_user_event(
    State(db): State<Database>,
    AppPath((user_id, event_id)): AppPath<(i64, i64)>,
    AppJson(req): AppJson<UpdateEventUserRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let view =
        services::update_user_event(db.pool(), user_id, event_id, req, clock::now()).await?;

    Ok(Json(EventFullDto::from(view)).into_response())
}

#[utoipa::path(
    get,
    path = "/admin/events",
    params(AdminEventFilter, PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Matching events", body = Vec<EventFullDto>),
        (status = 400, description = "Invalid query parameters", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn search_admin_events(
    State(db): State<Database>,
    AppQuery(filter): AppQuery<AdminEventFilter>,
    AppQuery(page): AppQuery<PaginationParams>,
) -> Result<Response, WebError> {
    filter.validate().map_err(WebError::BadRequest)?;
    page.validate().map_err(WebError::BadRequest)?;

    let views = services::search_admin(db.pool(), &filter, &page).await?;

    let response: Vec<EventFullDto> = views.into_iter().map(EventFullDto::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    patch,
    path = "/admin/events/{event_id}",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = UpdateEventAdminRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Event updated", body = EventFullDto),
        (status = 400, description = "Validation error or event date too soon", body = ApiError),
        (status = 404, description = "Event or category not found", body = ApiError),
        (status = 409, description = "State transition not allowed", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn update_admin_event(
    State(db): State<Database>,
    AppPath(event_id): AppPath<i64>,
    AppJson(req): AppJson<UpdateEventAdminRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let view = services::update_admin_event(db.pool(), event_id, req, clock::now()).await?;

    Ok(Json(EventFullDto::from(view)).into_response())
}

#[utoipa::path(
    get,
    path = "/events",
    params(PublicEventFilter, PaginationParams),
    responses(
        (status = 200, description = "Published events", body = Vec<EventShortDto>),
        (status = 400, description = "Invalid query parameters", body = ApiError)
    ),
    tag = "events"
)]
pub async fn search_public_events(
    State(db): State<Database>,
    State(stats): State<StatsClient>,
    OriginalUri(uri): OriginalUri,
    ClientIp(ip): ClientIp,
    AppQuery(filter): AppQuery<PublicEventFilter>,
    AppQuery(page): AppQuery<PaginationParams>,
) -> Result<Response, WebError> {
    filter.validate().map_err(WebError::BadRequest)?;
    page.validate().map_err(WebError::BadRequest)?;

    let hit = services::hit(uri.path(), ip);
    let views =
        services::search_public(db.pool(), &stats, &filter, &page, hit, clock::now()).await?;

    let response: Vec<EventShortDto> = views.into_iter().map(EventShortDto::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/events/{event_id}",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Published event", body = EventFullDto),
        (status = 404, description = "Event not found or not published", body = ApiError)
    ),
    tag = "events"
)]
pub async fn get_public_event(
    State(db): State<Database>,
    State(stats): State<StatsClient>,
    OriginalUri(uri): OriginalUri,
    ClientIp(ip): ClientIp,
    AppPath(event_id): AppPath<i64>,
) -> Result<Response, WebError> {
    let hit = services::hit(uri.path(), ip);
    let view = services::get_public_event(db.pool(), &stats, event_id, hit, clock::now()).await?;

    Ok(Json(EventFullDto::from(view)).into_response())
}
