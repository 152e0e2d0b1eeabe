use sqlx::PgPool;
use storage::{
    dto::{
        common::PaginationParams,
        user::{NewUserRequest, UserFilter},
    },
    error::Result,
    models::User,
    repository::user::UserRepository,
    services::user_removal,
};

/// List users, optionally restricted to the filter's ids
pub async fn list_users(
    pool: &PgPool,
    filter: &UserFilter,
    page: &PaginationParams,
) -> Result<Vec<User>> {
    let repo = UserRepository::new(pool);
    repo.list(filter.ids.as_deref(), page).await
}

/// Register a new user
pub async fn create_user(pool: &PgPool, request: &NewUserRequest) -> Result<User> {
    let repo = UserRepository::new(pool);
    let user = repo.create(request).await?;
    tracing::info!("Created user {}", user.user_id);
    Ok(user)
}

/// Delete a user with everything they own
pub async fn delete_user(pool: &PgPool, user_id: i64) -> Result<()> {
    user_removal::delete_user(pool, user_id).await
}
