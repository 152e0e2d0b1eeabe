use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::category::CategoryDto;
use super::common::{comma_separated, datetime, not_blank};
use super::user::UserShortDto;
use crate::models::{AdminStateAction, EventState, EventView, UserStateAction};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationDto {
    pub lat: f32,
    pub lon: f32,
}

/// Request payload for creating a new event
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEventRequest {
    #[validate(length(min = 20, max = 2000, message = "Annotation must be between 20 and 2000 characters"))]
    #[validate(custom(function = "not_blank"))]
    pub annotation: String,

    pub category: i64,

    #[validate(length(min = 20, max = 7000, message = "Description must be between 20 and 7000 characters"))]
    #[validate(custom(function = "not_blank"))]
    pub description: String,

    #[serde(with = "datetime")]
    #[schema(value_type = String, example = "2030-12-31 18:00:00")]
    pub event_date: NaiveDateTime,

    pub location: LocationDto,

    pub paid: Option<bool>,

    #[validate(range(min = 0, message = "Participant limit must not be negative"))]
    pub participant_limit: Option<i32>,

    pub request_moderation: Option<bool>,

    #[validate(length(min = 3, max = 120, message = "Title must be between 3 and 120 characters"))]
    #[validate(custom(function = "not_blank"))]
    pub title: String,
}

/// Request payload for an initiator editing their event; absent fields are kept
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventUserRequest {
    #[validate(length(min = 20, max = 2000))]
    #[validate(custom(function = "not_blank"))]
    pub annotation: Option<String>,

    pub category: Option<i64>,

    #[validate(length(min = 20, max = 7000))]
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,

    #[serde(default, with = "datetime::option")]
    #[schema(value_type = Option<String>, example = "2030-12-31 18:00:00")]
    pub event_date: Option<NaiveDateTime>,

    pub location: Option<LocationDto>,

    pub paid: Option<bool>,

    #[validate(range(min = 0))]
    pub participant_limit: Option<i32>,

    pub request_moderation: Option<bool>,

    pub state_action: Option<UserStateAction>,

    #[validate(length(min = 3, max = 120))]
    #[validate(custom(function = "not_blank"))]
    pub title: Option<String>,
}

/// Request payload for an admin moderating an event; absent fields are kept
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventAdminRequest {
    #[validate(length(min = 20, max = 2000))]
    #[validate(custom(function = "not_blank"))]
    pub annotation: Option<String>,

    pub category: Option<i64>,

    #[validate(length(min = 20, max = 7000))]
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,

    #[serde(default, with = "datetime::option")]
    #[schema(value_type = Option<String>, example = "2030-12-31 18:00:00")]
    pub event_date: Option<NaiveDateTime>,

    pub location: Option<LocationDto>,

    pub paid: Option<bool>,

    #[validate(range(min = 0))]
    pub participant_limit: Option<i32>,

    pub request_moderation: Option<bool>,

    pub state_action: Option<AdminStateAction>,

    #[validate(length(min = 3, max = 120))]
    #[validate(custom(function = "not_blank"))]
    pub title: Option<String>,
}

/// Field changes shared by user and admin updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub annotation: Option<String>,
    pub category: Option<i64>,
    pub description: Option<String>,
    pub event_date: Option<NaiveDateTime>,
    pub location: Option<LocationDto>,
    pub paid: Option<bool>,
    pub participant_limit: Option<i32>,
    pub request_moderation: Option<bool>,
    pub title: Option<String>,
}

impl UpdateEventUserRequest {
    pub fn into_parts(self) -> (EventChanges, Option<UserStateAction>) {
        let changes = EventChanges {
            annotation: self.annotation,
            category: self.category,
            description: self.description,
            event_date: self.event_date,
            location: self.location,
            paid: self.paid,
            participant_limit: self.participant_limit,
            request_moderation: self.request_moderation,
            title: self.title,
        };
        (changes, self.state_action)
    }
}

impl UpdateEventAdminRequest {
    pub fn into_parts(self) -> (EventChanges, Option<AdminStateAction>) {
        let changes = EventChanges {
            annotation: self.annotation,
            category: self.category,
            description: self.description,
            event_date: self.event_date,
            location: self.location,
            paid: self.paid,
            participant_limit: self.participant_limit,
            request_moderation: self.request_moderation,
            title: self.title,
        };
        (changes, self.state_action)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventFullDto {
    pub id: i64,
    pub annotation: String,
    pub category: CategoryDto,
    pub confirmed_requests: i32,
    #[serde(with = "datetime")]
    #[schema(value_type = String)]
    pub created_on: NaiveDateTime,
    pub description: String,
    #[serde(with = "datetime")]
    #[schema(value_type = String)]
    pub event_date: NaiveDateTime,
    pub initiator: UserShortDto,
    pub location: LocationDto,
    pub paid: bool,
    pub participant_limit: i32,
    #[serde(with = "datetime::option")]
    #[schema(value_type = Option<String>)]
    pub published_on: Option<NaiveDateTime>,
    pub request_moderation: bool,
    pub state: EventState,
    pub title: String,
    pub views: i64,
    pub rating: Option<f64>,
    pub my_rating: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventShortDto {
    pub id: i64,
    pub annotation: String,
    pub category: CategoryDto,
    pub confirmed_requests: i32,
    #[serde(with = "datetime")]
    #[schema(value_type = String)]
    pub event_date: NaiveDateTime,
    pub initiator: UserShortDto,
    pub paid: bool,
    pub title: String,
    pub rating: Option<f64>,
    pub my_rating: Option<i32>,
    pub views: i64,
}

impl From<EventView> for EventFullDto {
    fn from(view: EventView) -> Self {
        let event = view.event;
        Self {
            id: event.event_id,
            annotation: event.annotation,
            category: CategoryDto {
                id: event.category_id,
                name: view.category_name,
            },
            confirmed_requests: event.confirmed_requests,
            created_on: event.created_on,
            description: event.description,
            event_date: event.event_date,
            initiator: UserShortDto {
                id: event.initiator_id,
                name: view.initiator_name,
            },
            location: LocationDto {
                lat: view.lat,
                lon: view.lon,
            },
            paid: event.paid,
            participant_limit: event.participant_limit,
            published_on: event.published_on,
            request_moderation: event.request_moderation,
            state: event.state,
            title: event.title,
            views: event.views,
            rating: event.rating,
            my_rating: None,
        }
    }
}

impl From<EventView> for EventShortDto {
    fn from(view: EventView) -> Self {
        let event = view.event;
        Self {
            id: event.event_id,
            annotation: event.annotation,
            category: CategoryDto {
                id: event.category_id,
                name: view.category_name,
            },
            confirmed_requests: event.confirmed_requests,
            event_date: event.event_date,
            initiator: UserShortDto {
                id: event.initiator_id,
                name: view.initiator_name,
            },
            paid: event.paid,
            title: event.title,
            rating: event.rating,
            my_rating: None,
            views: event.views,
        }
    }
}

impl EventFullDto {
    pub fn with_my_rating(mut self, my_rating: Option<i32>) -> Self {
        self.my_rating = my_rating;
        self
    }
}

impl EventShortDto {
    pub fn with_my_rating(mut self, my_rating: Option<i32>) -> Self {
        self.my_rating = my_rating;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSort {
    EventDate,
    Views,
}

impl EventSort {
    pub fn as_column(&self) -> &'static str {
        match self {
            Self::EventDate => "e.event_date",
            Self::Views => "e.views",
        }
    }
}

/// Admin search over events in any state
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct AdminEventFilter {
    /// Comma separated initiator ids
    #[serde(default, deserialize_with = "comma_separated")]
    #[param(value_type = Option<String>)]
    pub users: Option<Vec<i64>>,

    /// Comma separated states (PENDING, PUBLISHED, CANCELED)
    #[serde(default, deserialize_with = "comma_separated")]
    #[param(value_type = Option<String>)]
    pub states: Option<Vec<EventState>>,

    /// Comma separated category ids
    #[serde(default, deserialize_with = "comma_separated")]
    #[param(value_type = Option<String>)]
    pub categories: Option<Vec<i64>>,

    #[serde(default, with = "datetime::option")]
    #[param(value_type = Option<String>)]
    pub range_start: Option<NaiveDateTime>,

    #[serde(default, with = "datetime::option")]
    #[param(value_type = Option<String>)]
    pub range_end: Option<NaiveDateTime>,
}

/// Public search over published events
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct PublicEventFilter {
    /// Case-insensitive match on annotation or description
    pub text: Option<String>,

    /// Comma separated category ids
    #[serde(default, deserialize_with = "comma_separated")]
    #[param(value_type = Option<String>)]
    pub categories: Option<Vec<i64>>,

    pub paid: Option<bool>,

    #[serde(default, with = "datetime::option")]
    #[param(value_type = Option<String>)]
    pub range_start: Option<NaiveDateTime>,

    #[serde(default, with = "datetime::option")]
    #[param(value_type = Option<String>)]
    pub range_end: Option<NaiveDateTime>,

    #[serde(default)]
    pub only_available: bool,

    #[param(value_type = Option<String>)]
    pub sort: Option<EventSort>,
}

fn validate_range(
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<(), String> {
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err("Wrong dates in request: rangeStart is after rangeEnd".to_string());
    }
    Ok(())
}

impl AdminEventFilter {
    pub fn validate(&self) -> Result<(), String> {
        validate_range(self.range_start, self.range_end)
    }
}

impl PublicEventFilter {
    pub fn validate(&self) -> Result<(), String> {
        validate_range(self.range_start, self.range_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_keeps_absent_fields_empty() {
        let req: UpdateEventUserRequest =
            serde_json::from_str(r#"{"title": "New title", "stateAction": "CANCEL_REVIEW"}"#)
                .unwrap();
        let (changes, action) = req.into_parts();
        assert_eq!(changes.title.as_deref(), Some("New title"));
        assert_eq!(changes.annotation, None);
        assert_eq!(changes.event_date, None);
        assert_eq!(action, Some(UserStateAction::CancelReview));
    }

    #[test]
    fn test_new_event_validation() {
        let req: NewEventRequest = serde_json::from_str(
            r#"{
                "annotation": "short",
                "category": 1,
                "description": "A long enough description of the event",
                "eventDate": "2030-01-01 10:00:00",
                "location": {"lat": 55.75, "lon": 37.61},
                "participantLimit": -1,
                "title": "Meetup"
            }"#,
        )
        .unwrap();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("annotation"));
        assert!(fields.contains_key("participant_limit"));
        assert!(!fields.contains_key("title"));
    }

    #[test]
    fn test_whitespace_text_fields_are_blank() {
        let req = NewEventRequest {
            annotation: " ".repeat(25),
            category: 1,
            description: "A long enough description of the event".to_string(),
            event_date: datetime::parse("2030-01-01 10:00:00").unwrap(),
            location: LocationDto { lat: 55.75, lon: 37.61 },
            paid: None,
            participant_limit: None,
            request_moderation: None,
            title: "\t\t\t\t".to_string(),
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields["annotation"][0].code, "blank");
        assert_eq!(fields["title"][0].code, "blank");
        assert!(!fields.contains_key("description"));

        let update = UpdateEventAdminRequest {
            description: Some(" ".repeat(30)),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_public_filter_rejects_inverted_range() {
        let filter = PublicEventFilter {
            range_start: Some(datetime::parse("2030-02-01 00:00:00").unwrap()),
            range_end: Some(datetime::parse("2030-01-01 00:00:00").unwrap()),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_admin_filter_parses_states() {
        let filter: AdminEventFilter =
            serde_json::from_str(r#"{"states": "PENDING,CANCELED", "users": "3"}"#).unwrap();
        assert_eq!(
            filter.states,
            Some(vec![EventState::Pending, EventState::Canceled])
        );
        assert_eq!(filter.users, Some(vec![3]));
    }
}
