use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::request::{
        NewRequestParams, ParticipationRequestDto, RequestStatusUpdate, RequestStatusUpdateResult,
    },
};

use crate::clock;
use crate::error::{ApiError, WebError};
use crate::extract::{AppJson, AppPath, AppQuery};

use super::services;

#[utoipa::path(
    get,
    path = "/users/{user_id}/requests",
    params(
        ("user_id" = i64, Path, description = "Requester id")
    ),
    responses(
        (status = 200, description = "Requests filed by the user", body = Vec<ParticipationRequestDto>),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "requests"
)]
pub async fn list_user_requests(
    State(db): State<Database>,
    AppPath(user_id): AppPath<i64>,
) -> Result<Response, WebError> {
    let requests = services::list_user_requests(db.pool(), user_id).await?;

    let response: Vec<ParticipationRequestDto> =
        requests.into_iter().map(ParticipationRequestDto::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/requests",
    params(
        ("user_id" = i64, Path, description = "Requester id"),
        NewRequestParams
    ),
    responses(
        (status = 201, description = "Request filed", body = ParticipationRequestDto),
        (status = 404, description = "User or event not found", body = ApiError),
        (status = 409, description = "Duplicate, own, unpublished or full event", body = ApiError)
    ),
    tag = "requests"
)]
pub async fn create_request(
    State(db): State<Database>,
    AppPath(user_id): AppPath<i64>,
    AppQuery(params): AppQuery<NewRequestParams>,
) -> Result<Response, WebError> {
    let request =
        services::create_request(db.pool(), user_id, params.event_id, clock::now()).await?;

    Ok((StatusCode::CREATED, Json(ParticipationRequestDto::from(request))).into_response())
}

#[utoipa::path(
    patch,
    path = "/users/{user_id}/requests/{request_id}/cancel",
    params(
        ("user_id" = i64, Path, description = "Requester id"),
        ("request_id" = i64, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request canceled", body = ParticipationRequestDto),
        (status = 404, description = "Request not found for this user", body = ApiError),
        (status = 409, description = "Request can no longer be canceled", body = ApiError)
    ),
    tag = "requests"
)]
pub async fn cancel_request(
    State(db): State<Database>,
    AppPath((user_id, request_id)): AppPath<(i64, i64)>,
) -> Result<Response, WebError> {
    let request = services::cancel_request(db.pool(), user_id, request_id).await?;

    Ok(Json(ParticipationRequestDto::from(request)).into_response())
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/events/{event_id}/requests",
    params(
        ("user_id" = i64, Path, description = "Initiator id"),
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Requests for the event", body = Vec<ParticipationRequestDto>),
        (status = 404, description = "User or event not found", body = ApiError),
        (status = 409, description = "User is not the initiator", body = ApiError)
    ),
    tag = "requests"
)]
pub async fn list_event_requests(
    State(db): State<Database>,
    AppPath((user_id, event_id)): AppPath<(i64, i64)>,
) -> Result<Response, WebError> {
    let requests = services::list_event_requests(db.pool(), user_id, event_id).await?;

    let response: Vec<ParticipationRequestDto> =
        requests.into_iter().map(ParticipationRequestDto::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    patch,
    path = "/users/{user_id}/events/{event_id}/requests",
    params(
        ("user_id" = i64, Path, description = "Initiator id"),
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = RequestStatusUpdate,
    responses(
        (status = 200, description = "Requests confirmed or rejected", body = RequestStatusUpdateResult),
        (status = 400, description = "Empty batch or unsupported status", body = ApiError),
        (status = 404, description = "Event or request not found", body = ApiError),
        (status = 409, description = "Limit reached, non-pending request or not the initiator", body = ApiError)
    ),
    tag = "requests"
)]
pub async fn update_request_statuses(
    State(db): State<Database>,
    AppPath((user_id, event_id)): AppPath<(i64, i64)>,
    AppJson(update): AppJson<RequestStatusUpdate>,
) -> Result<Response, WebError> {
    update.validate().map_err(WebError::BadRequest)?;

    let result = services::update_request_statuses(db.pool(), user_id, event_id, &update).await?;

    Ok(Json(result).into_response())
}
