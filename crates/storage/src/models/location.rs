use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Location {
    pub location_id: i64,
    pub lat: f32,
    pub lon: f32,
}
