use chrono::NaiveDateTime;
use sqlx::PgPool;
use storage::{
    dto::request::{RequestStatusUpdate, RequestStatusUpdateResult},
    error::Result,
    models::ParticipationRequest,
    repository::{event::EventRepository, request::RequestRepository, user::UserRepository},
    services::{event_lifecycle, participation},
};

/// Requests filed by `user_id`
pub async fn list_user_requests(pool: &PgPool, user_id: i64) -> Result<Vec<ParticipationRequest>> {
    UserRepository::new(pool).ensure_exists(user_id).await?;
    RequestRepository::new(pool).list_by_requester(user_id).await
}

pub async fn create_request(
    pool: &PgPool,
    user_id: i64,
    event_id: i64,
    now: NaiveDateTime,
) -> Result<ParticipationRequest> {
    participation::create_request(pool, user_id, event_id, now).await
}

pub async fn cancel_request(
    pool: &PgPool,
    user_id: i64,
    request_id: i64,
) -> Result<ParticipationRequest> {
    participation::cancel_request(pool, user_id, request_id).await
}

/// Requests filed for an event owned by `user_id`
pub async fn list_event_requests(
    pool: &PgPool,
    user_id: i64,
    event_id: i64,
) -> Result<Vec<ParticipationRequest>> {
    UserRepository::new(pool).ensure_exists(user_id).await?;

    let event = EventRepository::new(pool).find_by_id(event_id).await?;
    event_lifecycle::ensure_initiator(&event, user_id)?;

    RequestRepository::new(pool).list_by_event(event_id).await
}

pub async fn update_request_statuses(
    pool: &PgPool,
    user_id: i64,
    event_id: i64,
    update: &RequestStatusUpdate,
) -> Result<RequestStatusUpdateResult> {
    participation::update_statuses(pool, user_id, event_id, update).await
}
