use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::{
        category::{CategoryDto, CategoryRequest},
        common::PaginationParams,
    },
};
use validator::Validate;

use crate::error::{ApiError, WebError};
use crate::extract::{AppJson, AppPath, AppQuery};

use super::services;

#[utoipa::path(
    get,
    path = "/categories",
    params(PaginationParams),
    responses(
        (status = 200, description = "Categories page", body = Vec<CategoryDto>)
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(db): State<Database>,
    AppQuery(page): AppQuery<PaginationParams>,
) -> Result<Response, WebError> {
    page.validate().map_err(WebError::BadRequest)?;

    let categories = services::list_categories(db.pool(), &page).await?;

    let response: Vec<CategoryDto> = categories.into_iter().map(CategoryDto::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/categories/{cat_id}",
    params(
        ("cat_id" = i64, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Category found", body = CategoryDto),
        (status = 404, description = "Category not found", body = ApiError)
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(db): State<Database>,
    AppPath(cat_id): AppPath<i64>,
) -> Result<Response, WebError> {
    let category = services::get_category(db.pool(), cat_id).await?;

    Ok(Json(CategoryDto::from(category)).into_response())
}

#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CategoryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Category created", body = CategoryDto),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 409, description = "Name already taken", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn create_category(
    State(db): State<Database>,
    AppJson(req): AppJson<CategoryRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let category = services::create_category(db.pool(), &req.name).await?;

    Ok((StatusCode::CREATED, Json(CategoryDto::from(category))).into_response())
}

#[utoipa::path(
    patch,
    path = "/admin/categories/{cat_id}",
    params(
        ("cat_id" = i64, Path, description = "Category id")
    ),
    request_body = CategoryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Category renamed", body = CategoryDto),
        (status = 404, description = "Category not found", body = ApiError),
        (status = 409, description = "Name already taken", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn update_category(
    State(db): State<Database>,
    AppPath(cat_id): AppPath<i64>,
    AppJson(req): AppJson<CategoryRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let category = services::update_category(db.pool(), cat_id, &req.name).await?;

    Ok(Json(CategoryDto::from(category)).into_response())
}

#[utoipa::path(
    delete,
    path = "/admin/categories/{cat_id}",
    params(
        ("cat_id" = i64, Path, description = "Category id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ApiError),
        (status = 409, description = "Category still has events", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn delete_category(
    State(db): State<Database>,
    AppPath(cat_id): AppPath<i64>,
) -> Result<Response, WebError> {
    services::delete_category(db.pool(), cat_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
