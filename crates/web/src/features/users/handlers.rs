use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::{
        common::PaginationParams,
        user::{NewUserRequest, UserDto, UserFilter},
    },
};
use validator::Validate;

use crate::error::{ApiError, WebError};
use crate::extract::{AppJson, AppPath, AppQuery};

use super::services;

#[utoipa::path(
    get,
    path = "/admin/users",
    params(UserFilter, PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Users found", body = Vec<UserDto>),
        (status = 400, description = "Invalid query parameters", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn list_users(
    State(db): State<Database>,
    AppQuery(filter): AppQuery<UserFilter>,
    AppQuery(page): AppQuery<PaginationParams>,
) -> Result<Response, WebError> {
    page.validate().map_err(WebError::BadRequest)?;

    let users = services::list_users(db.pool(), &filter, &page).await?;

    let response: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = NewUserRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn create_user(
    State(db): State<Database>,
    AppJson(req): AppJson<NewUserRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let user = services::create_user(db.pool(), &req).await?;

    Ok((StatusCode::CREATED, Json(UserDto::from(user))).into_response())
}

#[utoipa::path(
    delete,
    path = "/admin/users/{user_id}",
    params(
        ("user_id" = i64, Path, description = "User id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn delete_user(
    State(db): State<Database>,
    AppPath(user_id): AppPath<i64>,
) -> Result<Response, WebError> {
    services::delete_user(db.pool(), user_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
