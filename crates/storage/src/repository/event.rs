use chrono::NaiveDateTime;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::dto::common::PaginationParams;
use crate::dto::event::{AdminEventFilter, LocationDto, NewEventRequest, PublicEventFilter};
use crate::error::{Result, StorageError};
use crate::models::{Event, EventState, EventView, Location};

/// Columns of `EventView`; expects `events e`, `categories c`, `users u`, `locations l`.
pub(crate) const EVENT_VIEW_COLUMNS: &str = r#"
    e.event_id, e.annotation, e.description, e.title, e.category_id, e.initiator_id,
    e.location_id, e.created_on, e.event_date, e.published_on, e.paid,
    e.participant_limit, e.confirmed_requests, e.request_moderation, e.state,
    e.rating, e.rating_count, e.views,
    c.name AS category_name, u.name AS initiator_name, l.lat, l.lon
"#;

pub(crate) const EVENT_VIEW_JOINS: &str = r#"
    JOIN categories c ON c.category_id = e.category_id
    JOIN users u ON u.user_id = e.initiator_id
    JOIN locations l ON l.location_id = e.location_id
"#;

const EVENT_COLUMNS: &str = r#"
    event_id, annotation, description, title, category_id, initiator_id, location_id,
    created_on, event_date, published_on, paid, participant_limit, confirmed_requests,
    request_moderation, state, rating, rating_count, views
"#;

fn event_view_query() -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(format!(
        "SELECT {} FROM events e {} WHERE 1=1",
        EVENT_VIEW_COLUMNS, EVENT_VIEW_JOINS
    ))
}

/// Escape LIKE wildcards so user text is matched literally.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_page(query: &mut QueryBuilder<'static, Postgres>, page: &PaginationParams) {
    query.push(" LIMIT ");
    query.push_bind(page.limit());
    query.push(" OFFSET ");
    query.push_bind(page.offset());
}

/// Append the admin search predicates and ordering.
pub(crate) fn push_admin_filter(
    query: &mut QueryBuilder<'static, Postgres>,
    filter: &AdminEventFilter,
) {
    if let Some(users) = filter.users.as_ref().filter(|v| !v.is_empty()) {
        query.push(" AND e.initiator_id = ANY(");
        query.push_bind(users.clone());
        query.push(")");
    }

    if let Some(states) = filter.states.as_ref().filter(|v| !v.is_empty()) {
        query.push(" AND e.state IN (");
        let mut separated = query.separated(", ");
        for state in states {
            separated.push_bind(*state);
        }
        separated.push_unseparated(")");
    }

    if let Some(categories) = filter.categories.as_ref().filter(|v| !v.is_empty()) {
        query.push(" AND e.category_id = ANY(");
        query.push_bind(categories.clone());
        query.push(")");
    }

    if let Some(start) = filter.range_start {
        query.push(" AND e.event_date >= ");
        query.push_bind(start);
    }

    if let Some(end) = filter.range_end {
        query.push(" AND e.event_date <= ");
        query.push_bind(end);
    }

    query.push(" ORDER BY e.event_id");
}

/// Append the public search predicates and ordering. Only published events
/// are visible and the range starts at `now` unless given.
pub(crate) fn push_public_filter(
    query: &mut QueryBuilder<'static, Postgres>,
    filter: &PublicEventFilter,
    now: NaiveDateTime,
) {
    query.push(" AND e.state = ");
    query.push_bind(EventState::Published);

    if let Some(text) = filter.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(text);
        query.push(" AND (e.annotation ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR e.description ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(categories) = filter.categories.as_ref().filter(|v| !v.is_empty()) {
        query.push(" AND e.category_id = ANY(");
        query.push_bind(categories.clone());
        query.push(")");
    }

    if let Some(paid) = filter.paid {
        query.push(" AND e.paid = ");
        query.push_bind(paid);
    }

    query.push(" AND e.event_date >= ");
    query.push_bind(filter.range_start.unwrap_or(now));

    if let Some(end) = filter.range_end {
        query.push(" AND e.event_date <= ");
        query.push_bind(end);
    }

    if filter.only_available {
        query.push(" AND (e.participant_limit = 0 OR e.confirmed_requests < e.participant_limit)");
    }

    match filter.sort {
        Some(sort) => {
            query.push(" ORDER BY ");
            query.push(sort.as_column());
            query.push(" DESC, e.event_id");
        }
        None => {
            query.push(" ORDER BY e.event_id");
        }
    }
}

/// Repository for Event database operations
pub struct EventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE event_id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("Event", id))?;

        Ok(event)
    }

    /// Get an event joined with its category, initiator and location
    pub async fn find_view(&self, id: i64) -> Result<EventView> {
        let mut query = event_view_query();
        query.push(" AND e.event_id = ");
        query.push_bind(id);

        let view = query
            .build_query_as::<EventView>()
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found("Event", id))?;

        Ok(view)
    }

    pub async fn list_by_initiator(
        &self,
        initiator_id: i64,
        page: &PaginationParams,
    ) -> Result<Vec<EventView>> {
        let mut query = event_view_query();
        query.push(" AND e.initiator_id = ");
        query.push_bind(initiator_id);
        query.push(" ORDER BY e.event_id");
        push_page(&mut query, page);

        let views = query.build_query_as::<EventView>().fetch_all(self.pool).await?;

        Ok(views)
    }

    pub async fn search_admin(
        &self,
        filter: &AdminEventFilter,
        page: &PaginationParams,
    ) -> Result<Vec<EventView>> {
        let mut query = event_view_query();
        push_admin_filter(&mut query, filter);
        push_page(&mut query, page);

        let views = query.build_query_as::<EventView>().fetch_all(self.pool).await?;

        Ok(views)
    }

    pub async fn search_public(
        &self,
        filter: &PublicEventFilter,
        page: &PaginationParams,
        now: NaiveDateTime,
    ) -> Result<Vec<EventView>> {
        let mut query = event_view_query();
        push_public_filter(&mut query, filter, now);
        push_page(&mut query, page);

        let views = query.build_query_as::<EventView>().fetch_all(self.pool).await?;

        Ok(views)
    }

    /// Store the location and the event in one transaction
    pub async fn create(
        &self,
        initiator_id: i64,
        req: &NewEventRequest,
        created_on: NaiveDateTime,
    ) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let location_id = insert_location(&mut tx, &req.location).await?;

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (
                annotation, description, title, category_id, initiator_id, location_id,
                created_on, event_date, paid, participant_limit, request_moderation, state
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(&req.annotation)
        .bind(&req.description)
        .bind(&req.title)
        .bind(req.category)
        .bind(initiator_id)
        .bind(location_id)
        .bind(created_on)
        .bind(req.event_date)
        .bind(req.paid.unwrap_or(false))
        .bind(req.participant_limit.unwrap_or(0))
        .bind(req.request_moderation.unwrap_or(true))
        .bind(EventState::Pending)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::from(e).map_constraint("Event references a missing row"))?;

        tx.commit().await?;

        Ok(event)
    }

    /// Persist a merged event, storing a new location row when one is given
    pub async fn update(&self, event: &Event, location: Option<&LocationDto>) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let location_id = match location {
            Some(location) => insert_location(&mut tx, location).await?,
            None => event.location_id,
        };

        let updated = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET annotation = $2,
                description = $3,
                title = $4,
                category_id = $5,
                location_id = $6,
                event_date = $7,
                published_on = $8,
                paid = $9,
                participant_limit = $10,
                request_moderation = $11,
                state = $12
            WHERE event_id = $1
              AND ($10 = 0 OR confirmed_requests <= $10)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event.event_id)
        .bind(&event.annotation)
        .bind(&event.description)
        .bind(&event.title)
        .bind(event.category_id)
        .bind(location_id)
        .bind(event.event_date)
        .bind(event.published_on)
        .bind(event.paid)
        .bind(event.participant_limit)
        .bind(event.request_moderation)
        .bind(event.state)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            // Either gone, or seats were confirmed since the event was read.
            self.find_by_id(event.event_id).await?;
            return Err(StorageError::Conflict(
                "Participant limit is below the number of confirmed requests".to_string(),
            ));
        };

        tx.commit().await?;

        Ok(updated)
    }

    pub async fn update_views(&self, id: i64, views: i64) -> Result<()> {
        sqlx::query("UPDATE events SET views = $2 WHERE event_id = $1")
            .bind(id)
            .bind(views)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

async fn insert_location(conn: &mut PgConnection, location: &LocationDto) -> Result<i64> {
    let location = sqlx::query_as::<_, Location>(
        "INSERT INTO locations (lat, lon) VALUES ($1, $2) RETURNING location_id, lat, lon",
    )
    .bind(location.lat)
    .bind(location.lon)
    .fetch_one(conn)
    .await?;

    Ok(location.location_id)
}

/// Lock the event row for the rest of the transaction
pub(crate) async fn lock_event(conn: &mut PgConnection, id: i64) -> Result<Event> {
    let event = sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events WHERE event_id = $1 FOR UPDATE",
        EVENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| StorageError::not_found("Event", id))?;

    Ok(event)
}

/// Move the confirmed counter by `delta`, refusing to exceed a nonzero limit
/// or drop below zero. Returns the new counter.
pub(crate) async fn adjust_confirmed(conn: &mut PgConnection, id: i64, delta: i32) -> Result<i32> {
    let confirmed: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE events
        SET confirmed_requests = confirmed_requests + $2
        WHERE event_id = $1
          AND confirmed_requests + $2 >= 0
          AND (participant_limit = 0 OR confirmed_requests + $2 <= participant_limit)
        RETURNING confirmed_requests
        "#,
    )
    .bind(id)
    .bind(delta)
    .fetch_optional(conn)
    .await?;

    confirmed.ok_or_else(|| {
        StorageError::Conflict("Event participation limit has been reached.".to_string())
    })
}

pub(crate) async fn set_rating(
    conn: &mut PgConnection,
    id: i64,
    rating: Option<f64>,
    rating_count: i32,
) -> Result<()> {
    sqlx::query("UPDATE events SET rating = $2, rating_count = $3 WHERE event_id = $1")
        .bind(id)
        .bind(rating)
        .bind(rating_count)
        .execute(conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::event::EventSort;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("jazz"), "%jazz%");
    }

    #[test]
    fn test_public_filter_always_restricts_to_published() {
        let mut query = event_view_query();
        push_public_filter(&mut query, &PublicEventFilter::default(), NaiveDateTime::MIN);
        let sql = query.sql();

        assert!(sql.contains("e.state = $1"));
        assert!(sql.contains("e.event_date >= $2"));
        assert!(!sql.contains("ILIKE"));
        assert!(sql.ends_with("ORDER BY e.event_id"));
    }

    #[test]
    fn test_public_filter_composes_all_predicates() {
        let filter = PublicEventFilter {
            text: Some("Rock".to_string()),
            categories: Some(vec![1, 2]),
            paid: Some(false),
            range_start: None,
            range_end: Some(NaiveDateTime::MAX),
            only_available: true,
            sort: Some(EventSort::Views),
        };
        let mut query = event_view_query();
        push_public_filter(&mut query, &filter, NaiveDateTime::MIN);
        let sql = query.sql();

        assert!(sql.contains("(e.annotation ILIKE $2 OR e.description ILIKE $3)"));
        assert!(sql.contains("e.category_id = ANY($4)"));
        assert!(sql.contains("e.paid = $5"));
        assert!(sql.contains("e.event_date <= $7"));
        assert!(sql.contains("e.confirmed_requests < e.participant_limit"));
        assert!(sql.contains("ORDER BY e.views DESC"));
    }

    #[test]
    fn test_admin_filter_skips_empty_lists() {
        let filter = AdminEventFilter {
            users: Some(vec![]),
            states: Some(vec![EventState::Pending, EventState::Published]),
            ..Default::default()
        };
        let mut query = event_view_query();
        push_admin_filter(&mut query, &filter);
        let sql = query.sql();

        assert!(!sql.contains("initiator_id = ANY"));
        assert!(sql.contains("e.state IN ($1, $2)"));
        assert!(!sql.contains("e.event_date >="));
        assert!(!sql.contains("e.event_date <="));
        assert!(sql.ends_with("ORDER BY e.event_id"));
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_adjust_confirmed_stops_at_limit(pool: PgPool) {
        use crate::test_fixtures as fixtures;

        let organizer = fixtures::insert_user(&pool, "organizer").await;
        let category = fixtures::insert_category(&pool, "Concerts").await;
        let event_id = fixtures::insert_event(&pool, organizer, category, 1).await;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(adjust_confirmed(&mut conn, event_id, 1).await.unwrap(), 1);

        let err = adjust_confirmed(&mut conn, event_id, 1).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        assert_eq!(adjust_confirmed(&mut conn, event_id, -1).await.unwrap(), 0);
        assert!(adjust_confirmed(&mut conn, event_id, -1).await.is_err());

        let event = EventRepository::new(&pool).find_by_id(event_id).await.unwrap();
        assert_eq!(event.confirmed_requests, 0);
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_update_refuses_limit_below_confirmed(pool: PgPool) {
        use crate::test_fixtures as fixtures;

        let organizer = fixtures::insert_user(&pool, "organizer").await;
        let category = fixtures::insert_category(&pool, "Concerts").await;
        let event_id = fixtures::insert_event(&pool, organizer, category, 5).await;

        let repo = EventRepository::new(&pool);
        let stale = repo.find_by_id(event_id).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        adjust_confirmed(&mut conn, event_id, 3).await.unwrap();
        drop(conn);

        let mut lowered = stale.clone();
        lowered.participant_limit = 2;
        let err = repo.update(&lowered, None).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        lowered.participant_limit = 3;
        let updated = repo.update(&lowered, None).await.unwrap();
        assert_eq!(updated.participant_limit, 3);
        assert_eq!(updated.confirmed_requests, 3);
    }
}
