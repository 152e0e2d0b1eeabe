use sqlx::PgPool;
use storage::{
    dto::common::PaginationParams,
    error::{Result, StorageError},
    models::Category,
    repository::category::CategoryRepository,
};

pub async fn list_categories(pool: &PgPool, page: &PaginationParams) -> Result<Vec<Category>> {
    let repo = CategoryRepository::new(pool);
    repo.list(page).await
}

pub async fn get_category(pool: &PgPool, category_id: i64) -> Result<Category> {
    let repo = CategoryRepository::new(pool);
    repo.find_by_id(category_id).await
}

pub async fn create_category(pool: &PgPool, name: &str) -> Result<Category> {
    let repo = CategoryRepository::new(pool);
    repo.create(name.trim()).await
}

pub async fn update_category(pool: &PgPool, category_id: i64, name: &str) -> Result<Category> {
    let repo = CategoryRepository::new(pool);
    repo.update(category_id, name.trim()).await
}

/// Delete a category that no event references
pub async fn delete_category(pool: &PgPool, category_id: i64) -> Result<()> {
    let repo = CategoryRepository::new(pool);

    repo.find_by_id(category_id).await?;
    if repo.count_events(category_id).await? > 0 {
        return Err(StorageError::Conflict("The category is not empty.".to_string()));
    }

    repo.delete(category_id).await
}
