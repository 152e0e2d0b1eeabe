use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rating {
    pub rating_id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub value: i32,
}
