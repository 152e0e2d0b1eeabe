use sqlx::PgPool;

use crate::dto::common::PaginationParams;
use crate::error::{Result, StorageError};
use crate::models::Category;

/// Repository for Category database operations
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, page: &PaginationParams) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT category_id, name
            FROM categories
            ORDER BY category_id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT category_id, name FROM categories WHERE category_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("Category", id))?;

        Ok(category)
    }

    pub async fn create(&self, name: &str) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING category_id, name
            "#,
        )
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| StorageError::from(e).map_constraint("Category name already exists"))?;

        Ok(category)
    }

    pub async fn update(&self, id: i64, name: &str) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2
            WHERE category_id = $1
            RETURNING category_id, name
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StorageError::from(e).map_constraint("Category name already exists"))?
        .ok_or_else(|| StorageError::not_found("Category", id))?;

        Ok(category)
    }

    /// Number of events filed under the category
    pub async fn count_events(&self, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE category_id = $1")
            .bind(id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE category_id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| StorageError::from(e).map_constraint("The category is not empty."))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Category", id));
        }

        Ok(())
    }
}
