use std::collections::HashMap;

use sqlx::{FromRow, PgConnection, PgPool, QueryBuilder};

use super::event::{EVENT_VIEW_COLUMNS, EVENT_VIEW_JOINS};
use crate::dto::common::PaginationParams;
use crate::dto::compilation::{NewCompilationRequest, UpdateCompilationRequest};
use crate::error::{Result, StorageError};
use crate::models::{Compilation, EventView};

#[derive(Debug, FromRow)]
struct CompilationEventRow {
    compilation_id: i64,
    #[sqlx(flatten)]
    view: EventView,
}

/// Repository for Compilation database operations
pub struct CompilationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompilationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Compilation> {
        let compilation = sqlx::query_as::<_, Compilation>(
            "SELECT compilation_id, title, pinned FROM compilations WHERE compilation_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("Compilation", id))?;

        Ok(compilation)
    }

    pub async fn list(
        &self,
        pinned: Option<bool>,
        page: &PaginationParams,
    ) -> Result<Vec<Compilation>> {
        let mut query = QueryBuilder::new("SELECT compilation_id, title, pinned FROM compilations");

        if let Some(pinned) = pinned {
            query.push(" WHERE pinned = ");
            query.push_bind(pinned);
        }

        query.push(" ORDER BY compilation_id LIMIT ");
        query.push_bind(page.limit());
        query.push(" OFFSET ");
        query.push_bind(page.offset());

        let compilations = query
            .build_query_as::<Compilation>()
            .fetch_all(self.pool)
            .await?;

        Ok(compilations)
    }

    /// Events of each requested compilation, keyed by compilation id
    pub async fn events_for(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<EventView>>> {
        let mut grouped: HashMap<i64, Vec<EventView>> = HashMap::new();
        if ids.is_empty() {
            return Ok(grouped);
        }

        let rows = sqlx::query_as::<_, CompilationEventRow>(&format!(
            r#"
            SELECT ce.compilation_id, {}
            FROM compilation_events ce
            JOIN events e ON e.event_id = ce.event_id
            {}
            WHERE ce.compilation_id = ANY($1)
            ORDER BY ce.compilation_id, e.event_id
            "#,
            EVENT_VIEW_COLUMNS, EVENT_VIEW_JOINS
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        for row in rows {
            grouped.entry(row.compilation_id).or_default().push(row.view);
        }

        Ok(grouped)
    }

    pub async fn create(&self, req: &NewCompilationRequest) -> Result<Compilation> {
        let mut tx = self.pool.begin().await?;

        let compilation = sqlx::query_as::<_, Compilation>(
            r#"
            INSERT INTO compilations (title, pinned)
            VALUES ($1, $2)
            RETURNING compilation_id, title, pinned
            "#,
        )
        .bind(&req.title)
        .bind(req.pinned)
        .fetch_one(&mut *tx)
        .await?;

        link_events(&mut tx, compilation.compilation_id, &req.events).await?;

        tx.commit().await?;

        Ok(compilation)
    }

    /// Apply the given fields; a present event list replaces the old one
    pub async fn update(&self, id: i64, req: &UpdateCompilationRequest) -> Result<Compilation> {
        let mut tx = self.pool.begin().await?;

        let compilation = sqlx::query_as::<_, Compilation>(
            r#"
            UPDATE compilations
            SET title = COALESCE($2, title),
                pinned = COALESCE($3, pinned)
            WHERE compilation_id = $1
            RETURNING compilation_id, title, pinned
            "#,
        )
        .bind(id)
        .bind(req.title.as_deref())
        .bind(req.pinned)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StorageError::not_found("Compilation", id))?;

        if let Some(events) = &req.events {
            sqlx::query("DELETE FROM compilation_events WHERE compilation_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_events(&mut tx, id, events).await?;
        }

        tx.commit().await?;

        Ok(compilation)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM compilations WHERE compilation_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Compilation", id));
        }

        Ok(())
    }
}

/// Link existing events to the compilation; unknown ids are skipped
async fn link_events(conn: &mut PgConnection, compilation_id: i64, events: &[i64]) -> Result<()> {
    if events.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO compilation_events (compilation_id, event_id)
        SELECT $1, event_id FROM events WHERE event_id = ANY($2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(compilation_id)
    .bind(events)
    .execute(conn)
    .await?;

    Ok(())
}
