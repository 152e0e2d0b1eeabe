use chrono::{Duration, NaiveDateTime};
use sqlx::PgPool;
use stats_client::{EndpointHit, StatsClient, StatsQuery};
use storage::{
    dto::{
        common::PaginationParams,
        event::{
            AdminEventFilter, NewEventRequest, PublicEventFilter, UpdateEventAdminRequest,
            UpdateEventUserRequest,
        },
    },
    error::{Result, StorageError},
    models::{EventState, EventView},
    repository::{
        category::CategoryRepository, event::EventRepository, rating::RatingRepository,
        user::UserRepository,
    },
    services::event_lifecycle::{self, USER_LEAD_HOURS},
};

use crate::state::APP_NAME;

/// How far back view counts are looked up.
const VIEWS_LOOKBACK_DAYS: i64 = 3650;

/// Create an event in PENDING state for `user_id`
pub async fn create_event(
    pool: &PgPool,
    user_id: i64,
    request: &NewEventRequest,
    now: NaiveDateTime,
) -> Result<EventView> {
    UserRepository::new(pool).ensure_exists(user_id).await?;
    CategoryRepository::new(pool).find_by_id(request.category).await?;
    event_lifecycle::ensure_event_date(request.event_date, now, USER_LEAD_HOURS)?;

    let repo = EventRepository::new(pool);
    let event = repo.create(user_id, request, now).await?;
    tracing::info!("User {} created event {}", user_id, event.event_id);

    repo.find_view(event.event_id).await
}

/// Events created by `user_id`
pub async fn list_user_events(
    pool: &PgPool,
    user_id: i64,
    page: &PaginationParams,
) -> Result<Vec<EventView>> {
    UserRepository::new(pool).ensure_exists(user_id).await?;
    EventRepository::new(pool).list_by_initiator(user_id, page).await
}

/// One of the user's own events together with the user's rating of it
pub async fn get_user_event(
    pool: &PgPool,
    user_id: i64,
    event_id: i64,
) -> Result<(EventView, Option<i32>)> {
    UserRepository::new(pool).ensure_exists(user_id).await?;

    let view = EventRepository::new(pool).find_view(event_id).await?;
    event_lifecycle::ensure_initiator(&view.event, user_id)?;

    let my_rating = RatingRepository::new(pool).my_rating(user_id, event_id).await?;
    Ok((view, my_rating))
}

/// Apply an initiator edit to an unpublished event
pub async fn update_user_event(
    pool: &PgPool,
    user_id: i64,
    event_id: i64,
    request: UpdateEventUserRequest,
    now: NaiveDateTime,
) -> Result<EventView> {
    UserRepository::new(pool).ensure_exists(user_id).await?;

    let repo = EventRepository::new(pool);
    let mut event = repo.find_by_id(event_id).await?;
    event_lifecycle::ensure_initiator(&event, user_id)?;

    let (changes, action) = request.into_parts();
    if let Some(category_id) = changes.category {
        CategoryRepository::new(pool).find_by_id(category_id).await?;
    }

    event_lifecycle::apply_user_update(&mut event, &changes, action, now)?;
    repo.update(&event, changes.location.as_ref()).await?;
    tracing::info!("User {} updated event {} ({})", user_id, event_id, event.state);

    repo.find_view(event_id).await
}

pub async fn search_admin(
    pool: &PgPool,
    filter: &AdminEventFilter,
    page: &PaginationParams,
) -> Result<Vec<EventView>> {
    EventRepository::new(pool).search_admin(filter, page).await
}

/// Apply an admin edit, publishing or rejecting the event on request
pub async fn update_admin_event(
    pool: &PgPool,
    event_id: i64,
    request: UpdateEventAdminRequest,
    now: NaiveDateTime,
) -> Result<EventView> {
    let repo = EventRepository::new(pool);
    let mut event = repo.find_by_id(event_id).await?;

    let (changes, action) = request.into_parts();
    if let Some(category_id) = changes.category {
        CategoryRepository::new(pool).find_by_id(category_id).await?;
    }

    event_lifecycle::apply_admin_update(&mut event, &changes, action, now)?;
    repo.update(&event, changes.location.as_ref()).await?;
    tracing::info!("Admin updated event {} ({})", event_id, event.state);

    repo.find_view(event_id).await
}

/// Search published events and record the visit
pub async fn search_public(
    pool: &PgPool,
    stats: &StatsClient,
    filter: &PublicEventFilter,
    page: &PaginationParams,
    hit: EndpointHit,
    now: NaiveDateTime,
) -> Result<Vec<EventView>> {
    record_hit(stats, hit.at(now)).await;

    EventRepository::new(pool).search_public(filter, page, now).await
}

/// Fetch a published event, record the visit and refresh its view count
pub async fn get_public_event(
    pool: &PgPool,
    stats: &StatsClient,
    event_id: i64,
    hit: EndpointHit,
    now: NaiveDateTime,
) -> Result<EventView> {
    let repo = EventRepository::new(pool);
    let mut view = repo.find_view(event_id).await?;
    if view.event.state != EventState::Published {
        return Err(StorageError::not_found("Event", event_id));
    }

    let uri = hit.uri.clone();
    record_hit(stats, hit.at(now)).await;

    if let Some(views) = unique_views(stats, &uri, now).await
        && views != view.event.views
    {
        repo.update_views(event_id, views).await?;
        view.event.views = views;
    }

    Ok(view)
}

/// Build the hit for a public request
pub fn hit(uri: &str, ip: std::net::IpAddr) -> EndpointHit {
    EndpointHit::new(APP_NAME, uri, ip.to_string())
}

async fn record_hit(stats: &StatsClient, hit: EndpointHit) {
    if let Err(e) = stats.record_hit(&hit).await {
        tracing::warn!("Failed to record hit for {}: {}", hit.uri, e);
    }
}

async fn unique_views(stats: &StatsClient, uri: &str, now: NaiveDateTime) -> Option<i64> {
    let query = StatsQuery {
        start: now - Duration::days(VIEWS_LOOKBACK_DAYS),
        end: now,
        uris: vec![uri.to_string()],
        unique: true,
    };

    match stats.get_stats(&query).await {
        Ok(stats) => Some(
            stats
                .iter()
                .find(|s| s.uri == uri)
                .map(|s| s.hits)
                .unwrap_or(0),
        ),
        Err(e) => {
            tracing::warn!("Failed to fetch views for {}: {}", uri, e);
            None
        }
    }
}
