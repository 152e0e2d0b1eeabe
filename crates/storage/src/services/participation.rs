use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::dto::request::{ParticipationRequestDto, RequestStatusUpdate, RequestStatusUpdateResult};
use crate::error::{Result, StorageError};
use crate::models::{Event, EventState, ParticipationRequest, RequestStatus};
use crate::repository::event as event_repo;
use crate::repository::request::{self as request_repo, RequestRepository};
use crate::repository::user::UserRepository;
use crate::services::event_lifecycle::ensure_initiator;

/// How a batch decision splits over the targeted requests.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatusPlan {
    pub confirm: Vec<i64>,
    pub reject: Vec<i64>,
    /// Requests that did not fit under the participant limit.
    pub cancel: Vec<i64>,
}

/// Check whether `user_id` may file a request for the event.
pub fn ensure_can_request(event: &Event, user_id: i64, already_requested: bool) -> Result<()> {
    if already_requested {
        return Err(StorageError::Conflict(
            "The request for this event has already been sent".to_string(),
        ));
    }
    if event.initiator_id == user_id {
        return Err(StorageError::Conflict(
            "The initiator cannot request participation in their own event".to_string(),
        ));
    }
    if event.state != EventState::Published {
        return Err(StorageError::Conflict(
            "Cannot participate in an unpublished event".to_string(),
        ));
    }
    if event.is_full() {
        return Err(StorageError::Conflict(
            "The participant limit has been reached".to_string(),
        ));
    }
    Ok(())
}

/// Status of a new request: events without a limit confirm immediately.
pub fn initial_status(event: &Event) -> RequestStatus {
    if event.has_unlimited_seats() {
        RequestStatus::Confirmed
    } else {
        RequestStatus::Pending
    }
}

/// Split `requests` (sorted by id) according to the owner's decision.
pub fn plan_status_update(
    event: &Event,
    requests: &[ParticipationRequest],
    status: RequestStatus,
) -> Result<StatusPlan> {
    if let Some(request) = requests.iter().find(|r| r.status != RequestStatus::Pending) {
        return Err(StorageError::Conflict(format!(
            "Request must have status PENDING, request id={} is {}",
            request.request_id, request.status
        )));
    }

    let mut plan = StatusPlan::default();

    match status {
        RequestStatus::Rejected => {
            plan.reject = requests.iter().map(|r| r.request_id).collect();
        }
        RequestStatus::Confirmed => {
            if event.is_full() {
                return Err(StorageError::Conflict(
                    "The participant limit has been reached".to_string(),
                ));
            }

            let mut confirmed = event.confirmed_requests;
            for request in requests {
                if event.has_unlimited_seats() || confirmed < event.participant_limit {
                    plan.confirm.push(request.request_id);
                    confirmed += 1;
                } else {
                    plan.cancel.push(request.request_id);
                }
            }
        }
        other => {
            return Err(StorageError::InvalidInput(format!(
                "Status must be CONFIRMED or REJECTED, got {}",
                other
            )));
        }
    }

    Ok(plan)
}

/// Check that `user_id` may cancel the request.
pub fn ensure_cancellable(request: &ParticipationRequest, user_id: i64) -> Result<()> {
    if request.requester_id != user_id {
        return Err(StorageError::not_found("Request", request.request_id));
    }
    match request.status {
        RequestStatus::Pending | RequestStatus::Confirmed => Ok(()),
        other => Err(StorageError::Conflict(format!(
            "Only pending or confirmed requests can be canceled, request is {}",
            other
        ))),
    }
}

/// File a participation request, confirming it at once for unlimited events.
pub async fn create_request(
    pool: &PgPool,
    user_id: i64,
    event_id: i64,
    now: NaiveDateTime,
) -> Result<ParticipationRequest> {
    UserRepository::new(pool).ensure_exists(user_id).await?;

    let mut tx = pool.begin().await?;

    let event = event_repo::lock_event(&mut tx, event_id).await?;
    let already_requested = request_repo::exists_for(&mut tx, user_id, event_id).await?;
    ensure_can_request(&event, user_id, already_requested)?;

    let status = initial_status(&event);
    if status == RequestStatus::Confirmed {
        event_repo::adjust_confirmed(&mut tx, event_id, 1).await?;
    }

    let request = request_repo::insert(
        &mut tx,
        &ParticipationRequest {
            request_id: 0,
            created: now,
            event_id,
            requester_id: user_id,
            status,
        },
    )
    .await?;

    tx.commit().await?;

    info!(
        "Request {} for event {} created with status {}",
        request.request_id, event_id, request.status
    );

    Ok(request)
}

/// Confirm or reject a batch of pending requests for an owned event.
pub async fn update_statuses(
    pool: &PgPool,
    user_id: i64,
    event_id: i64,
    update: &RequestStatusUpdate,
) -> Result<RequestStatusUpdateResult> {
    update.validate().map_err(StorageError::InvalidInput)?;
    UserRepository::new(pool).ensure_exists(user_id).await?;

    let ids: Vec<i64> = update
        .request_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut tx = pool.begin().await?;

    let event = event_repo::lock_event(&mut tx, event_id).await?;
    ensure_initiator(&event, user_id)?;

    let requests = request_repo::lock_for_event(&mut tx, event_id, &ids).await?;
    if let Some(missing) = ids
        .iter()
        .find(|id| !requests.iter().any(|r| r.request_id == **id))
    {
        return Err(StorageError::not_found("Request", *missing));
    }

    let plan = plan_status_update(&event, &requests, update.status)?;
    debug!("Status plan for event {}: {:?}", event_id, plan);

    if !plan.confirm.is_empty() {
        let delta = i32::try_from(plan.confirm.len())
            .map_err(|_| StorageError::InvalidInput("Too many requests".to_string()))?;
        event_repo::adjust_confirmed(&mut tx, event_id, delta).await?;
    }

    let confirmed = request_repo::set_status(&mut tx, &plan.confirm, RequestStatus::Confirmed).await?;
    let rejected = request_repo::set_status(&mut tx, &plan.reject, RequestStatus::Rejected).await?;
    let canceled = request_repo::set_status(&mut tx, &plan.cancel, RequestStatus::Canceled).await?;

    tx.commit().await?;

    info!(
        "Event {}: {} confirmed, {} rejected, {} canceled over the limit",
        event_id,
        confirmed.len(),
        rejected.len(),
        canceled.len()
    );

    Ok(RequestStatusUpdateResult {
        confirmed_requests: confirmed.into_iter().map(ParticipationRequestDto::from).collect(),
        rejected_requests: rejected
            .into_iter()
            .chain(canceled)
            .map(ParticipationRequestDto::from)
            .collect(),
    })
}

/// Cancel the user's own request, releasing the seat if it held one.
pub async fn cancel_request(
    pool: &PgPool,
    user_id: i64,
    request_id: i64,
) -> Result<ParticipationRequest> {
    UserRepository::new(pool).ensure_exists(user_id).await?;
    let existing = RequestRepository::new(pool).find_by_id(request_id).await?;

    let mut tx = pool.begin().await?;

    // Event first, then request: same lock order as batch updates.
    event_repo::lock_event(&mut tx, existing.event_id).await?;
    let request = request_repo::lock_by_id(&mut tx, request_id).await?;
    ensure_cancellable(&request, user_id)?;

    if request.status == RequestStatus::Confirmed {
        event_repo::adjust_confirmed(&mut tx, request.event_id, -1).await?;
    }

    let mut updated =
        request_repo::set_status(&mut tx, &[request_id], RequestStatus::Canceled).await?;

    tx.commit().await?;

    updated
        .pop()
        .ok_or_else(|| StorageError::not_found("Request", request_id))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::dto::common::datetime;

    fn now() -> NaiveDateTime {
        datetime::parse("2030-06-01 12:00:00").unwrap()
    }

    fn event(limit: i32, confirmed: i32) -> Event {
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
            published_on: Some(now()),
            paid: false,
            participant_limit: limit,
            confirmed_requests: confirmed,
            request_moderation: true,
            state: EventState::Published,
            rating: None,
            rating_count: 0,
            views: 0,
        }
    }

    fn request(id: i64, status: RequestStatus) -> ParticipationRequest {
        ParticipationRequest {
            request_id: id,
            created: now(),
            event_id: 1,
            requester_id: 100 + id,
            status,
        }
    }

    #[test]
    fn test_unlimited_event_confirms_immediately() {
        assert_eq!(initial_status(&event(0, 3)), RequestStatus::Confirmed);
        assert_eq!(initial_status(&event(5, 0)), RequestStatus::Pending);
    }

    #[test]
    fn test_request_conflicts() {
        let published = event(2, 0);
        assert!(ensure_can_request(&published, 8, false).is_ok());
        assert!(ensure_can_request(&published, 8, true).is_err());
        assert!(ensure_can_request(&published, 7, false).is_err());
        assert!(ensure_can_request(&event(2, 2), 8, false).is_err());

        let mut pending = event(0, 0);
        pending.state = EventState::Pending;
        assert!(matches!(
            ensure_can_request(&pending, 8, false),
            Err(StorageError::Conflict(_))
        ));
    }

    #[test]
    fn test_confirm_overflow_is_canceled() {
        let requests = vec![
            request(1, RequestStatus::Pending),
            request(2, RequestStatus::Pending),
        ];
        let plan = plan_status_update(&event(1, 0), &requests, RequestStatus::Confirmed).unwrap();
        assert_eq!(plan.confirm, vec![1]);
        assert_eq!(plan.cancel, vec![2]);
        assert!(plan.reject.is_empty());
    }

    #[test]
    fn test_confirm_on_full_event_conflicts() {
        let requests = vec![request(3, RequestStatus::Pending)];
        let err = plan_status_update(&event(1, 1), &requests, RequestStatus::Confirmed).unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[test]
    fn test_confirmed_never_exceeds_limit() {
        let requests: Vec<_> = (1..=6).map(|id| request(id, RequestStatus::Pending)).collect();
        let plan = plan_status_update(&event(4, 1), &requests, RequestStatus::Confirmed).unwrap();
        assert_eq!(plan.confirm.len(), 3);
        assert_eq!(plan.cancel, vec![4, 5, 6]);
    }

    #[test]
    fn test_reject_applies_to_all() {
        let requests = vec![
            request(1, RequestStatus::Pending),
            request(2, RequestStatus::Pending),
        ];
        let plan = plan_status_update(&event(1, 1), &requests, RequestStatus::Rejected).unwrap();
        assert_eq!(plan.reject, vec![1, 2]);
        assert!(plan.confirm.is_empty());
    }

    #[test]
    fn test_non_pending_request_conflicts() {
        let requests = vec![
            request(1, RequestStatus::Pending),
            request(2, RequestStatus::Confirmed),
        ];
        assert!(plan_status_update(&event(0, 0), &requests, RequestStatus::Rejected).is_err());
    }

    #[test]
    fn test_cancellation_rules() {
        let confirmed = request(1, RequestStatus::Confirmed);
        assert!(ensure_cancellable(&confirmed, 101).is_ok());
        assert!(matches!(
            ensure_cancellable(&confirmed, 999),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            ensure_cancellable(&request(2, RequestStatus::Rejected), 102),
            Err(StorageError::Conflict(_))
        ));
    }
}
