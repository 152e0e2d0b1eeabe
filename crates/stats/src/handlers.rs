use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::Deserialize;
use sqlx::PgPool;
use stats_client::{EndpointHit, StatsQuery, ViewStats};
use utoipa::IntoParams;

use crate::error::{ApiError, StatsError};
use crate::extract::{AppJson, AppQuery};
use crate::repository::HitRepository;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsParams {
    /// Range start, `yyyy-MM-dd HH:mm:ss`
    #[serde(with = "stats_client::dto::datetime")]
    #[param(value_type = String, example = "2020-01-01 00:00:00")]
    pub start: NaiveDateTime,
    /// Range end, `yyyy-MM-dd HH:mm:ss`
    #[serde(with = "stats_client::dto::datetime")]
    #[param(value_type = String, example = "2030-01-01 00:00:00")]
    pub end: NaiveDateTime,
    /// Comma separated list of uris
    #[serde(default)]
    pub uris: Option<String>,
    /// Count distinct ips only
    #[serde(default)]
    pub unique: bool,
}

impl StatsParams {
    pub fn into_query(self) -> Result<StatsQuery, StatsError> {
        if self.start > self.end {
            return Err(StatsError::BadRequest(
                "Field: start. Error: must not be after end.".to_string(),
            ));
        }

        let uris = self
            .uris
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(StatsQuery {
            start: self.start,
            end: self.end,
            uris,
            unique: self.unique,
        })
    }
}

fn ensure_not_blank(field: &str, value: &str) -> Result<(), StatsError> {
    if value.trim().is_empty() {
        return Err(StatsError::BadRequest(format!(
            "Field: {}. Error: must not be blank. Value: '{}'",
            field, value
        )));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/hit",
    request_body = EndpointHit,
    responses(
        (status = 201, description = "Hit recorded", body = EndpointHit),
        (status = 400, description = "Blank field or malformed body", body = ApiError)
    ),
    tag = "stats"
)]
pub async fn record_hit(
    State(pool): State<PgPool>,
    AppJson(hit): AppJson<EndpointHit>,
) -> Result<Response, StatsError> {
    ensure_not_blank("app", &hit.app)?;
    ensure_not_blank("uri", &hit.uri)?;
    ensure_not_blank("ip", &hit.ip)?;

    let timestamp = hit
        .timestamp
        .unwrap_or_else(|| Local::now().naive_local().trunc_subsecs(0));

    let stored = HitRepository::new(&pool).insert(&hit, timestamp).await?;
    tracing::debug!("Recorded hit {} {} from {}", stored.app, stored.uri, stored.ip);

    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

#[utoipa::path(
    get,
    path = "/stats",
    params(StatsParams),
    responses(
        (status = 200, description = "Hits per app and uri, most visited first", body = Vec<ViewStats>),
        (status = 400, description = "Missing or inverted range", body = ApiError)
    ),
    tag = "stats"
)]
pub async fn get_stats(
    State(pool): State<PgPool>,
    AppQuery(params): AppQuery<StatsParams>,
) -> Result<Response, StatsError> {
    let query = params.into_query()?;

    let stats = HitRepository::new(&pool).stats(&query).await?;

    Ok(Json(stats).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(start: &str, end: &str, uris: Option<&str>) -> StatsParams {
        StatsParams {
            start: NaiveDateTime::parse_from_str(start, stats_client::dto::DATE_TIME_FORMAT)
                .unwrap(),
            end: NaiveDateTime::parse_from_str(end, stats_client::dto::DATE_TIME_FORMAT).unwrap(),
            uris: uris.map(String::from),
            unique: false,
        }
    }

    #[test]
    fn test_uris_are_split_and_trimmed() {
        let query = params(
            "2020-01-01 00:00:00",
            "2030-01-01 00:00:00",
            Some("/events/1, /events,,"),
        )
        .into_query()
        .unwrap();
        assert_eq!(query.uris, vec!["/events/1".to_string(), "/events".to_string()]);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = params("2030-01-01 00:00:00", "2020-01-01 00:00:00", None).into_query();
        assert!(matches!(result, Err(StatsError::BadRequest(_))));
    }

    #[test]
    fn test_blank_field_is_rejected() {
        assert!(ensure_not_blank("app", "ewm-main-service").is_ok());
        assert!(matches!(
            ensure_not_blank("ip", "  "),
            Err(StatsError::BadRequest(msg)) if msg.starts_with("Field: ip.")
        ));
    }
}
