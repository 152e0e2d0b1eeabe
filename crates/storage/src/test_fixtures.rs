//! Row builders for tests that run against a database.

use sqlx::PgPool;

use crate::models::RequestStatus;

pub async fn insert_user(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (email, name) VALUES ($1, $2) RETURNING user_id")
        .bind(format!("{}@example.com", name))
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn insert_category(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING category_id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// A published event starting in a month.
pub async fn insert_event(pool: &PgPool, initiator: i64, category: i64, limit: i32) -> i64 {
    let location: i64 =
        sqlx::query_scalar("INSERT INTO locations (lat, lon) VALUES (55.75, 37.62) RETURNING location_id")
            .fetch_one(pool)
            .await
            .unwrap();

    sqlx::query_scalar(
        r#"
        INSERT INTO events (annotation, description, title, category_id, initiator_id,
                            location_id, event_date, published_on, participant_limit, state)
        VALUES ('An annotation long enough', 'A description long enough', 'Concert', $1, $2,
                $3, LOCALTIMESTAMP(0) + INTERVAL '30 days', LOCALTIMESTAMP(0), $4, 'PUBLISHED')
        RETURNING event_id
        "#,
    )
    .bind(category)
    .bind(initiator)
    .bind(location)
    .bind(limit)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_request(pool: &PgPool, event_id: i64, requester: i64, status: RequestStatus) {
    sqlx::query("INSERT INTO requests (event_id, requester_id, status) VALUES ($1, $2, $3)")
        .bind(event_id)
        .bind(requester)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn insert_rating(pool: &PgPool, event_id: i64, user_id: i64, value: i32) {
    sqlx::query("INSERT INTO ratings (event_id, user_id, value) VALUES ($1, $2, $3)")
        .bind(event_id)
        .bind(user_id)
        .bind(value)
        .execute(pool)
        .await
        .unwrap();
}
