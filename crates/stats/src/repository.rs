use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use stats_client::{EndpointHit, StatsQuery, ViewStats};

use crate::error::Result;

#[derive(Debug, FromRow)]
struct ViewStatsRow {
    app: String,
    uri: String,
    hits: i64,
}

impl From<ViewStatsRow> for ViewStats {
    fn from(row: ViewStatsRow) -> Self {
        Self {
            app: row.app,
            uri: row.uri,
            hits: row.hits,
        }
    }
}

/// Repository for recorded endpoint hits
pub struct HitRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> HitRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a hit at the given time and return it as stored.
    pub async fn insert(&self, hit: &EndpointHit, timestamp: NaiveDateTime) -> Result<EndpointHit> {
        let (app, uri, ip, timestamp): (String, String, String, NaiveDateTime) = sqlx::query_as(
            r#"
            INSERT INTO hits (app, uri, ip, timestamp)
            VALUES ($1, $2, $3, $4)
            RETURNING app, uri, ip, timestamp
            "#,
        )
        .bind(&hit.app)
        .bind(&hit.uri)
        .bind(&hit.ip)
        .bind(timestamp)
        .fetch_one(self.pool)
        .await?;

        Ok(EndpointHit::new(app, uri, ip).at(timestamp))
    }

    pub async fn stats(&self, query: &StatsQuery) -> Result<Vec<ViewStats>> {
        let rows = stats_query(query)
            .build_query_as::<ViewStatsRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(ViewStats::from).collect())
    }
}

/// Hits per (app, uri) within `[start, end]`, most visited first.
fn stats_query(query: &StatsQuery) -> QueryBuilder<'static, Postgres> {
    let count = if query.unique {
        "COUNT(DISTINCT ip)"
    } else {
        "COUNT(ip)"
    };

    let mut builder = QueryBuilder::new(format!("SELECT app, uri, {} AS hits FROM hits", count));
    builder
        .push(" WHERE timestamp BETWEEN ")
        .push_bind(query.start)
        .push(" AND ")
        .push_bind(query.end);

    if !query.uris.is_empty() {
        builder.push(" AND uri = ANY(").push_bind(query.uris.clone()).push(")");
    }

    builder.push(" GROUP BY app, uri ORDER BY hits DESC, app, uri");
    builder
}
