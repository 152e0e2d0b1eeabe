use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Compilation {
    pub compilation_id: i64,
    pub title: String,
    pub pinned: bool,
}
