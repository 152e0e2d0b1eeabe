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
        compilation::{
            CompilationDto, CompilationFilter, NewCompilationRequest, UpdateCompilationRequest,
        },
    },
};
use validator::Validate;

use crate::error::{ApiError, WebError};
use crate::extract::{AppJson, AppPath, AppQuery};

use super::services;

#[utoipa::path(
    get,
    path = "/compilations",
    params(CompilationFilter, PaginationParams),
    responses(
        (status = 200, description = "Compilations page", body = Vec<CompilationDto>)
    ),
    tag = "compilations"
)]
pub async fn list_compilations(
    State(db): State<Database>,
    AppQuery(filter): AppQuery<CompilationFilter>,
    AppQuery(page): AppQuery<PaginationParams>,
) -> Result<Response, WebError> {
    page.validate().map_err(WebError::BadRequest)?;

    let compilations = services::list_compilations(db.pool(), filter.pinned, &page).await?;

    Ok(Json(compilations).into_response())
}

#[utoipa::path(
    get,
    path = "/compilations/{comp_id}",
    params(
        ("comp_id" = i64, Path, description = "Compilation id")
    ),
    responses(
        (status = 200, description = "Compilation found", body = CompilationDto),
        (status = 404, description = "Compilation not found", body = ApiError)
    ),
    tag = "compilations"
)]
pub async fn get_compilation(
    State(db): State<Database>,
    AppPath(comp_id): AppPath<i64>,
) -> Result<Response, WebError> {
    let compilation = services::get_compilation(db.pool(), comp_id).await?;

    Ok(Json(compilation).into_response())
}

#[utoipa::path(
    post,
    path = "/admin/compilations",
    request_body = NewCompilationRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Compilation created", body = CompilationDto),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn create_compilation(
    State(db): State<Database>,
    AppJson(req): AppJson<NewCompilationRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let compilation = services::create_compilation(db.pool(), &req).await?;

    Ok((StatusCode::CREATED, Json(compilation)).into_response())
}

#[utoipa::path(
    patch,
    path = "/admin/compilations/{comp_id}",
    params(
        ("comp_id" = i64, Path, description = "Compilation id")
    ),
    request_body = UpdateCompilationRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Compilation updated", body = CompilationDto),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Compilation not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn update_compilation(
    State(db): State<Database>,
    AppPath(comp_id): AppPath<i64>,
    AppJson(req): AppJson<UpdateCompilationRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let compilation = services::update_compilation(db.pool(), comp_id, &req).await?;

    Ok(Json(compilation).into_response())
}

#[utoipa::path(
    delete,
    path = "/admin/compilations/{comp_id}",
    params(
        ("comp_id" = i64, Path, description = "Compilation id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Compilation deleted"),
        (status = 404, description = "Compilation not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn delete_compilation(
    State(db): State<Database>,
    AppPath(comp_id): AppPath<i64>,
) -> Result<Response, WebError> {
    services::delete_compilation(db.pool(), comp_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
