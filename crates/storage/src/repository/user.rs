use sqlx::{PgConnection, PgPool, QueryBuilder};

use crate::dto::common::PaginationParams;
use crate::dto::user::NewUserRequest;
use crate::error::{Result, StorageError};
use crate::models::User;

/// Repository for User database operations
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List users, optionally restricted to the given ids
    pub async fn list(&self, ids: Option<&[i64]>, page: &PaginationParams) -> Result<Vec<User>> {
        let mut query = QueryBuilder::new("SELECT user_id, email, name, rating FROM users WHERE 1=1");

        if let Some(ids) = ids.filter(|ids| !ids.is_empty()) {
            query.push(" AND user_id = ANY(");
            query.push_bind(ids.to_vec());
            query.push(")");
        }

        query.push(" ORDER BY user_id LIMIT ");
        query.push_bind(page.limit());
        query.push(" OFFSET ");
        query.push_bind(page.offset());

        let users = query.build_query_as::<User>().fetch_all(self.pool).await?;

        Ok(users)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, name, rating
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("User", id))?;

        Ok(user)
    }

    /// Fail with `NotFound` unless the user exists
    pub async fn ensure_exists(&self, id: i64) -> Result<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        if exists {
            Ok(())
        } else {
            Err(StorageError::not_found("User", id))
        }
    }

    pub async fn create(&self, req: &NewUserRequest) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name)
            VALUES ($1, $2)
            RETURNING user_id, email, name, rating
            "#,
        )
        .bind(&req.email)
        .bind(&req.name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| StorageError::from(e).map_constraint("Email already exists"))?;

        Ok(user)
    }
}

/// Lock the user row, failing with `NotFound` when it is missing
pub(crate) async fn lock_user(conn: &mut PgConnection, id: i64) -> Result<()> {
    sqlx::query_scalar::<_, i64>("SELECT user_id FROM users WHERE user_id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| StorageError::not_found("User", id))?;

    Ok(())
}

pub(crate) async fn delete(conn: &mut PgConnection, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
        .bind(id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("User", id));
    }

    Ok(())
}

/// Recompute the organizer rating as the mean of their rated events
pub(crate) async fn refresh_rating(conn: &mut PgConnection, user_id: i64) -> Result<Option<f64>> {
    let rating: Option<f64> = sqlx::query_scalar(
        r#"
        UPDATE users
        SET rating = (
            SELECT AVG(rating) FROM events
            WHERE initiator_id = $1 AND rating IS NOT NULL
        )
        WHERE user_id = $1
        RETURNING rating
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;

    Ok(rating)
}
