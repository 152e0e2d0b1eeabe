use chrono::{Duration, NaiveDateTime};

use crate::dto::common::DATE_TIME_FORMAT;
use crate::dto::event::EventChanges;
use crate::error::{Result, StorageError};
use crate::models::{AdminStateAction, Event, EventState, UserStateAction};

/// Minimum lead time for dates set by the initiator.
pub const USER_LEAD_HOURS: i64 = 2;

/// Minimum lead time for dates set by an admin.
pub const ADMIN_LEAD_HOURS: i64 = 1;

/// Reject event dates closer than `lead_hours` to `now`.
pub fn ensure_event_date(date: NaiveDateTime, now: NaiveDateTime, lead_hours: i64) -> Result<()> {
    if date < now + Duration::hours(lead_hours) {
        return Err(StorageError::InvalidInput(format!(
            "Field: eventDate. Error: must be at least {} hours from now. Value: {}",
            lead_hours,
            date.format(DATE_TIME_FORMAT)
        )));
    }
    Ok(())
}

/// Copy every present field of `changes` onto the event.
///
/// The location is not touched here; a new location row is stored by the
/// repository when one is supplied.
pub fn apply_changes(event: &mut Event, changes: &EventChanges) {
    if let Some(annotation) = &changes.annotation {
        event.annotation = annotation.clone();
    }
    if let Some(category) = changes.category {
        event.category_id = category;
    }
    if let Some(description) = &changes.description {
        event.description = description.clone();
    }
    if let Some(event_date) = changes.event_date {
        event.event_date = event_date;
    }
    if let Some(paid) = changes.paid {
        event.paid = paid;
    }
    if let Some(limit) = changes.participant_limit {
        event.participant_limit = limit;
    }
    if let Some(moderation) = changes.request_moderation {
        event.request_moderation = moderation;
    }
    if let Some(title) = &changes.title {
        event.title = title.clone();
    }
}

/// Reject a nonzero limit below the seats already confirmed.
pub fn ensure_limit_fits(event: &Event, changes: &EventChanges) -> Result<()> {
    let lowered = changes
        .participant_limit
        .filter(|&limit| limit != 0 && limit < event.confirmed_requests);
    if let Some(limit) = lowered {
        return Err(StorageError::Conflict(format!(
            "Participant limit {} is below the {} confirmed requests",
            limit, event.confirmed_requests
        )));
    }
    Ok(())
}

/// Check that `user_id` created the event.
pub fn ensure_initiator(event: &Event, user_id: i64) -> Result<()> {
    if event.initiator_id != user_id {
        return Err(StorageError::Conflict(
            "User and event's initiator do not match.".to_string(),
        ));
    }
    Ok(())
}

/// Apply an initiator edit. Published events are frozen.
pub fn apply_user_update(
    event: &mut Event,
    changes: &EventChanges,
    action: Option<UserStateAction>,
    now: NaiveDateTime,
) -> Result<()> {
    if event.state == EventState::Published {
        return Err(StorageError::Conflict(
            "Only pending or canceled events can be changed".to_string(),
        ));
    }

    ensure_event_date(changes.event_date.unwrap_or(event.event_date), now, USER_LEAD_HOURS)?;
    ensure_limit_fits(event, changes)?;
    apply_changes(event, changes);

    match action {
        Some(UserStateAction::SendToReview) => event.state = EventState::Pending,
        Some(UserStateAction::CancelReview) => event.state = EventState::Canceled,
        None => {}
    }

    Ok(())
}

/// Apply an admin moderation edit.
pub fn apply_admin_update(
    event: &mut Event,
    changes: &EventChanges,
    action: Option<AdminStateAction>,
    now: NaiveDateTime,
) -> Result<()> {
    ensure_event_date(changes.event_date.unwrap_or(event.event_date), now, ADMIN_LEAD_HOURS)?;
    ensure_limit_fits(event, changes)?;

    match action {
        Some(AdminStateAction::PublishEvent) => {
            if event.state != EventState::Pending {
                return Err(StorageError::Conflict(format!(
                    "Cannot publish the event because it's not in the right state: {}",
                    event.state
                )));
            }
            apply_changes(event, changes);
            event.state = EventState::Published;
            event.published_on = Some(now);
        }
        Some(AdminStateAction::RejectEvent) => {
            if event.state == EventState::Published {
                return Err(StorageError::Conflict(
                    "Cannot reject the event because it has already been published".to_string(),
                ));
            }
            apply_changes(event, changes);
            event.state = EventState::Canceled;
        }
        None => apply_changes(event, changes),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::common::datetime;

    fn now() -> NaiveDateTime {
        datetime::parse("2030-06-01 12:00:00").unwrap()
    }

    fn event(state: EventState) -> Event {
        Event {
            event_id: 1,
            annotation: "An annotation long enough".to_string(),
            description: "A description long enough".to_string(),
            title: "Concert".to_string(),
            category_id: 1,
            initiator_id: 7,
            location_id: 1,
            created_on: now(),
            event_date: now() + Duration::days(10),
            published_on: None,
            paid: false,
            participant_limit: 0,
            confirmed_requests: 0,
            request_moderation: true,
            state,
            rating: None,
            rating_count: 0,
            views: 0,
        }
    }

    #[test]
    fn test_user_lead_time() {
        assert!(ensure_event_date(now() + Duration::hours(3), now(), USER_LEAD_HOURS).is_ok());
        let err = ensure_event_date(now() + Duration::hours(1), now(), USER_LEAD_HOURS).unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));
    }

    #[test]
    fn test_admin_lead_time() {
        assert!(ensure_event_date(now() + Duration::minutes(30), now(), ADMIN_LEAD_HOURS).is_err());
        assert!(ensure_event_date(now() + Duration::minutes(90), now(), ADMIN_LEAD_HOURS).is_ok());
    }

    #[test]
    fn test_user_cannot_edit_published_event() {
        let mut event = event(EventState::Published);
        let err = apply_user_update(&mut event, &EventChanges::default(), None, now()).unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[test]
    fn test_user_state_actions() {
        let mut event = event(EventState::Pending);
        apply_user_update(
            &mut event,
            &EventChanges::default(),
            Some(UserStateAction::CancelReview),
            now(),
        )
        .unwrap();
        assert_eq!(event.state, EventState::Canceled);

        apply_user_update(
            &mut event,
            &EventChanges::default(),
            Some(UserStateAction::SendToReview),
            now(),
        )
        .unwrap();
        assert_eq!(event.state, EventState::Pending);
    }

    #[test]
    fn test_stored_date_is_rechecked() {
        let mut event = event(EventState::Pending);
        event.event_date = now() + Duration::hours(1);
        let changes = EventChanges {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(apply_user_update(&mut event, &changes, None, now()).is_err());
        assert_eq!(event.title, "Concert");
    }

    #[test]
    fn test_admin_publish_sets_published_on() {
        let mut event = event(EventState::Pending);
        apply_admin_update(
            &mut event,
            &EventChanges::default(),
            Some(AdminStateAction::PublishEvent),
            now(),
        )
        .unwrap();
        assert_eq!(event.state, EventState::Published);
        assert_eq!(event.published_on, Some(now()));
    }

    #[test]
    fn test_admin_transitions_out_of_terminal_states() {
        let mut canceled = event(EventState::Canceled);
        assert!(
            apply_admin_update(
                &mut canceled,
                &EventChanges::default(),
                Some(AdminStateAction::PublishEvent),
                now(),
            )
            .is_err()
        );

        let mut published = event(EventState::Published);
        assert!(
            apply_admin_update(
                &mut published,
                &EventChanges::default(),
                Some(AdminStateAction::RejectEvent),
                now(),
            )
            .is_err()
        );
        assert!(
            apply_admin_update(
                &mut published,
                &EventChanges::default(),
                Some(AdminStateAction::PublishEvent),
                now(),
            )
            .is_err()
        );
    }

    #[test]
    fn test_apply_changes_keeps_absent_fields() {
        let mut event = event(EventState::Pending);
        let changes = EventChanges {
            paid: Some(true),
            participant_limit: Some(5),
            ..Default::default()
        };
        apply_changes(&mut event, &changes);
        assert!(event.paid);
        assert_eq!(event.participant_limit, 5);
        assert_eq!(event.title, "Concert");
        assert!(event.request_moderation);
    }

    #[test]
    fn test_limit_cannot_drop_below_confirmed() {
        let mut event = event(EventState::Pending);
        event.participant_limit = 10;
        event.confirmed_requests = 4;

        let lower = |limit| EventChanges {
            participant_limit: Some(limit),
            ..Default::default()
        };

        let err = apply_user_update(&mut event, &lower(3), None, now()).unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(event.participant_limit, 10);

        assert!(apply_admin_update(&mut event, &lower(2), None, now()).is_err());

        apply_user_update(&mut event, &lower(4), None, now()).unwrap();
        assert_eq!(event.participant_limit, 4);

        apply_admin_update(&mut event, &lower(0), None, now()).unwrap();
        assert_eq!(event.participant_limit, 0);
    }
}
