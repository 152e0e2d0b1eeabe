use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    /// Mean of the averages of this user's rated events.
    pub rating: Option<f64>,
}
