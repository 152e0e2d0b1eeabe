use sqlx::{PgConnection, PgPool};

use crate::error::{Result, StorageError};
use crate::models::{ParticipationRequest, RequestStatus};

const REQUEST_COLUMNS: &str = "request_id, created, event_id, requester_id, status";

/// Repository for participation request database operations
pub struct RequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RequestRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<ParticipationRequest> {
        let request = sqlx::query_as::<_, ParticipationRequest>(&format!(
            "SELECT {} FROM requests WHERE request_id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("Request", id))?;

        Ok(request)
    }

    /// Requests the user has filed for other people's events
    pub async fn list_by_requester(&self, requester_id: i64) -> Result<Vec<ParticipationRequest>> {
        let requests = sqlx::query_as::<_, ParticipationRequest>(&format!(
            "SELECT {} FROM requests WHERE requester_id = $1 ORDER BY request_id",
            REQUEST_COLUMNS
        ))
        .bind(requester_id)
        .fetch_all(self.pool)
        .await?;

        Ok(requests)
    }

    pub async fn list_by_event(&self, event_id: i64) -> Result<Vec<ParticipationRequest>> {
        let requests = sqlx::query_as::<_, ParticipationRequest>(&format!(
            "SELECT {} FROM requests WHERE event_id = $1 ORDER BY request_id",
            REQUEST_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(requests)
    }
}

/// Whether the user holds a confirmed seat at the event
pub(crate) async fn is_confirmed_participant(
    conn: &mut PgConnection,
    user_id: i64,
    event_id: i64,
) -> Result<bool> {
    let confirmed: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM requests
            WHERE requester_id = $1 AND event_id = $2 AND status = $3
        )
        "#,
    )
    .bind(user_id)
    .bind(event_id)
    .bind(RequestStatus::Confirmed)
    .fetch_one(conn)
    .await?;

    Ok(confirmed)
}

/// Events the user has filed a request for in any status, ascending
pub(crate) async fn event_ids_for_requester(
    conn: &mut PgConnection,
    requester_id: i64,
) -> Result<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT event_id FROM requests WHERE requester_id = $1 ORDER BY event_id",
    )
    .bind(requester_id)
    .fetch_all(conn)
    .await?;

    Ok(ids)
}

/// Events where the user holds a confirmed seat
pub(crate) async fn confirmed_event_ids(
    conn: &mut PgConnection,
    requester_id: i64,
) -> Result<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT event_id FROM requests WHERE requester_id = $1 AND status = $2 ORDER BY event_id",
    )
    .bind(requester_id)
    .bind(RequestStatus::Confirmed)
    .fetch_all(conn)
    .await?;

    Ok(ids)
}

pub(crate) async fn exists_for(conn: &mut PgConnection, user_id: i64, event_id: i64) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM requests WHERE requester_id = $1 AND event_id = $2)",
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

pub(crate) async fn insert(
    conn: &mut PgConnection,
    request: &ParticipationRequest,
) -> Result<ParticipationRequest> {
    let created = sqlx::query_as::<_, ParticipationRequest>(&format!(
        r#"
        INSERT INTO requests (created, event_id, requester_id, status)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        REQUEST_COLUMNS
    ))
    .bind(request.created)
    .bind(request.event_id)
    .bind(request.requester_id)
    .bind(request.status)
    .fetch_one(conn)
    .await
    .map_err(|e| StorageError::from(e).map_constraint("Request already exists"))?;

    Ok(created)
}

/// Lock the given requests of one event, in id order
pub(crate) async fn lock_for_event(
    conn: &mut PgConnection,
    event_id: i64,
    ids: &[i64],
) -> Result<Vec<ParticipationRequest>> {
    let requests = sqlx::query_as::<_, ParticipationRequest>(&format!(
        r#"
        SELECT {}
        FROM requests
        WHERE event_id = $1 AND request_id = ANY($2)
        ORDER BY request_id
        FOR UPDATE
        "#,
        REQUEST_COLUMNS
    ))
    .bind(event_id)
    .bind(ids)
    .fetch_all(conn)
    .await?;

    Ok(requests)
}

pub(crate) async fn lock_by_id(conn: &mut PgConnection, id: i64) -> Result<ParticipationRequest> {
    let request = sqlx::query_as::<_, ParticipationRequest>(&format!(
        "SELECT {} FROM requests WHERE request_id = $1 FOR UPDATE",
        REQUEST_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| StorageError::not_found("Request", id))?;

    Ok(request)
}

pub(crate) async fn set_status(
    conn: &mut PgConnection,
    ids: &[i64],
    status: RequestStatus,
) -> Result<Vec<ParticipationRequest>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut requests = sqlx::query_as::<_, ParticipationRequest>(&format!(
        r#"
        UPDATE requests
        SET status = $2
        WHERE request_id = ANY($1)
        RETURNING {}
        "#,
        REQUEST_COLUMNS
    ))
    .bind(ids)
    .bind(status)
    .fetch_all(conn)
    .await?;

    requests.sort_by_key(|r| r.request_id);

    Ok(requests)
}
