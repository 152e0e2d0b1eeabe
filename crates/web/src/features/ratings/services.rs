use sqlx::PgPool;
use storage::{
    dto::event::{EventFullDto, EventShortDto},
    error::Result,
    repository::{event::EventRepository, rating::RatingRepository, user::UserRepository},
    services::rating_aggregation,
};

/// Rate an event and return it with the caller's rating
pub async fn rate_event(
    pool: &PgPool,
    user_id: i64,
    event_id: i64,
    value: i32,
) -> Result<EventFullDto> {
    rating_aggregation::rate_event(pool, user_id, event_id, value).await?;

    let view = EventRepository::new(pool).find_view(event_id).await?;
    Ok(EventFullDto::from(view).with_my_rating(Some(value)))
}

pub async fn remove_rating(pool: &PgPool, user_id: i64, event_id: i64) -> Result<()> {
    rating_aggregation::remove_rating(pool, user_id, event_id).await
}

/// Events the user has rated, each with the user's own value
pub async fn list_rated_events(pool: &PgPool, user_id: i64) -> Result<Vec<EventShortDto>> {
    UserRepository::new(pool).ensure_exists(user_id).await?;

    let rows = RatingRepository::new(pool).rated_events(user_id).await?;

    Ok(rows
        .into_iter()
        .map(|row| EventShortDto::from(row.view).with_my_rating(Some(row.value)))
        .collect())
}
