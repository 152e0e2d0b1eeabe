use sqlx::{FromRow, PgConnection, PgPool};

use super::event::{EVENT_VIEW_COLUMNS, EVENT_VIEW_JOINS};
use crate::error::{Result, StorageError};
use crate::models::{EventView, Rating};

#[derive(Debug, FromRow)]
pub struct RatedEventRow {
    pub value: i32,
    #[sqlx(flatten)]
    pub view: EventView,
}

/// Repository for Rating database operations
pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The value the user gave the event, if any
    pub async fn my_rating(&self, user_id: i64, event_id: i64) -> Result<Option<i32>> {
        let value: Option<i32> =
            sqlx::query_scalar("SELECT value FROM ratings WHERE user_id = $1 AND event_id = $2")
                .bind(user_id)
                .bind(event_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(value)
    }

    /// Events the user has rated together with the given value
    pub async fn rated_events(&self, user_id: i64) -> Result<Vec<RatedEventRow>> {
        let rows = sqlx::query_as::<_, RatedEventRow>(&format!(
            r#"
            SELECT r.value, {}
            FROM ratings r
            JOIN events e ON e.event_id = r.event_id
            {}
            WHERE r.user_id = $1
            ORDER BY r.rating_id
            "#,
            EVENT_VIEW_COLUMNS, EVENT_VIEW_JOINS
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

pub(crate) async fn list_by_user(conn: &mut PgConnection, user_id: i64) -> Result<Vec<Rating>> {
    let ratings = sqlx::query_as::<_, Rating>(
        r#"
        SELECT rating_id, event_id, user_id, value
        FROM ratings
        WHERE user_id = $1
        ORDER BY event_id
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(ratings)
}

pub(crate) async fn lock_rating(
    conn: &mut PgConnection,
    user_id: i64,
    event_id: i64,
) -> Result<Option<Rating>> {
    let rating = sqlx::query_as::<_, Rating>(
        r#"
        SELECT rating_id, event_id, user_id, value
        FROM ratings
        WHERE user_id = $1 AND event_id = $2
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_optional(conn)
    .await?;

    Ok(rating)
}

pub(crate) async fn insert(
    conn: &mut PgConnection,
    user_id: i64,
    event_id: i64,
    value: i32,
) -> Result<Rating> {
    let rating = sqlx::query_as::<_, Rating>(
        r#"
        INSERT INTO ratings (event_id, user_id, value)
        VALUES ($1, $2, $3)
        RETURNING rating_id, event_id, user_id, value
        "#,
    )
    .bind(event_id)
    .bind(user_id)
    .bind(value)
    .fetch_one(conn)
    .await
    .map_err(|e| StorageError::from(e).map_constraint("Rating already exists"))?;

    Ok(rating)
}

pub(crate) async fn update_value(conn: &mut PgConnection, rating_id: i64, value: i32) -> Result<()> {
    sqlx::query("UPDATE ratings SET value = $2 WHERE rating_id = $1")
        .bind(rating_id)
        .bind(value)
        .execute(conn)
        .await?;

    Ok(())
}

pub(crate) async fn delete(conn: &mut PgConnection, rating_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM ratings WHERE rating_id = $1")
        .bind(rating_id)
        .execute(conn)
        .await?;

    Ok(())
}
