use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "event_state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    Pending,
    Published,
    Canceled,
}

impl EventState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Published => "PUBLISHED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PUBLISHED" => Ok(Self::Published),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(format!("Unknown event state: {}", other)),
        }
    }
}

/// State change an initiator may request while editing their own event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStateAction {
    SendToReview,
    CancelReview,
}

/// Moderation decision taken by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminStateAction {
    PublishEvent,
    RejectEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub event_id: i64,
    pub annotation: String,
    pub description: String,
    pub title: String,
    pub category_id: i64,
    pub initiator_id: i64,
    pub location_id: i64,
    pub created_on: NaiveDateTime,
    pub event_date: NaiveDateTime,
    pub published_on: Option<NaiveDateTime>,
    pub paid: bool,
    /// Zero means unlimited.
    pub participant_limit: i32,
    pub confirmed_requests: i32,
    pub request_moderation: bool,
    pub state: EventState,
    pub rating: Option<f64>,
    pub rating_count: i32,
    pub views: i64,
}

impl Event {
    pub fn has_unlimited_seats(&self) -> bool {
        self.participant_limit == 0
    }

    pub fn is_full(&self) -> bool {
        !self.has_unlimited_seats() && self.confirmed_requests >= self.participant_limit
    }
}

/// An event joined with the rows it references, as rendered in responses.
#[derive(Debug, Clone, FromRow)]
pub struct EventView {
    #[sqlx(flatten)]
    pub event: Event,
    pub category_name: String,
    pub initiator_name: String,
    pub lat: f32,
    pub lon: f32,
}
