use std::collections::{BTreeSet, HashMap, HashSet};

use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{Event, Rating};
use crate::repository::event as event_repo;
use crate::repository::rating as rating_repo;
use crate::repository::request as request_repo;
use crate::repository::user as user_repo;
use crate::services::rating_aggregation::RunningMean;

/// What deleting a user changes on one event they took part in.
#[derive(Debug, Clone, PartialEq)]
pub struct EventAdjustment {
    pub event_id: i64,
    pub initiator_id: i64,
    /// The user held a confirmed seat.
    pub release_seat: bool,
    /// The event average once the user's rating is gone.
    pub rating: Option<RunningMean>,
}

/// Work out the counter and rating changes for the locked events. Events the
/// user organizes are skipped since they go away with the user.
pub fn plan_removal(
    user_id: i64,
    events: &[Event],
    confirmed: &HashSet<i64>,
    ratings: &HashMap<i64, i32>,
) -> Vec<EventAdjustment> {
    events
        .iter()
        .filter(|event| event.initiator_id != user_id)
        .filter_map(|event| {
            let release_seat = confirmed.contains(&event.event_id);
            let rating = ratings
                .get(&event.event_id)
                .map(|&value| RunningMean::of(event).remove(value));

            (release_seat || rating.is_some()).then_some(EventAdjustment {
                event_id: event.event_id,
                initiator_id: event.initiator_id,
                release_seat,
                rating,
            })
        })
        .collect()
}

/// Delete a user together with their events, requests and ratings, keeping
/// the counters and averages of other people's events in step.
pub async fn delete_user(pool: &PgPool, user_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    // Holding the user row blocks new requests and ratings from this user.
    user_repo::lock_user(&mut tx, user_id).await?;

    let mut touched: BTreeSet<i64> = request_repo::event_ids_for_requester(&mut tx, user_id)
        .await?
        .into_iter()
        .collect();
    touched.extend(
        rating_repo::list_by_user(&mut tx, user_id)
            .await?
            .into_iter()
            .map(|r| r.event_id),
    );

    let mut events = Vec::with_capacity(touched.len());
    for event_id in &touched {
        events.push(event_repo::lock_event(&mut tx, *event_id).await?);
    }

    // Statuses and values are stable once the events are locked.
    let confirmed: HashSet<i64> = request_repo::confirmed_event_ids(&mut tx, user_id)
        .await?
        .into_iter()
        .collect();
    let ratings: HashMap<i64, i32> = rating_repo::list_by_user(&mut tx, user_id)
        .await?
        .into_iter()
        .map(|Rating { event_id, value, .. }| (event_id, value))
        .collect();

    let adjustments = plan_removal(user_id, &events, &confirmed, &ratings);

    let mut organizers = BTreeSet::new();
    for adjustment in &adjustments {
        if adjustment.release_seat {
            event_repo::adjust_confirmed(&mut tx, adjustment.event_id, -1).await?;
        }
        if let Some(mean) = adjustment.rating {
            event_repo::set_rating(&mut tx, adjustment.event_id, mean.average, mean.count).await?;
            organizers.insert(adjustment.initiator_id);
        }
        debug!(
            "Adjusted event {} for removal of user {}: {:?}",
            adjustment.event_id, user_id, adjustment
        );
    }

    user_repo::delete(&mut tx, user_id).await?;

    for organizer in organizers {
        user_repo::refresh_rating(&mut tx, organizer).await?;
    }

    tx.commit().await?;

    info!(
        "Deleted user {} and adjusted {} events",
        user_id,
        adjustments.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::common::datetime;
    use crate::models::{EventState, RequestStatus};
    use crate::test_fixtures as fixtures;

    fn event(event_id: i64, initiator_id: i64, rating: Option<f64>, rating_count: i32) -> Event {
        let now = datetime::parse("2030-06-01 12:00:00").unwrap();
        Event {
            event_id,
            annotation: "An annotation long enough".to_string(),
            description: "A description long enough".to_string(),
            title: "Concert".to_string(),
            category_id: 1,
            initiator_id,
            location_id: 1,
            created_on: now,
            event_date: now,
            published_on: Some(now),
            paid: false,
            participant_limit: 0,
            confirmed_requests: 2,
            request_moderation: true,
            state: EventState::Published,
            rating,
            rating_count,
            views: 0,
        }
    }

    #[test]
    fn test_plan_releases_seat_and_drops_rating() {
        let events = vec![event(10, 1, Some(3.0), 2)];
        let confirmed = HashSet::from([10]);
        let ratings = HashMap::from([(10, 5)]);

        let plan = plan_removal(2, &events, &confirmed, &ratings);

        assert_eq!(
            plan,
            vec![EventAdjustment {
                event_id: 10,
                initiator_id: 1,
                release_seat: true,
                rating: Some(RunningMean {
                    average: Some(1.0),
                    count: 1
                }),
            }]
        );
    }

    #[test]
    fn test_plan_skips_own_and_untouched_events() {
        let events = vec![event(10, 2, Some(4.0), 1), event(11, 1, None, 0)];
        // Event 11 only had a pending request.
        let plan = plan_removal(2, &events, &HashSet::from([10]), &HashMap::from([(10, 4)]));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_last_rating_clears_average() {
        let events = vec![event(10, 1, Some(5.0), 1)];
        let plan = plan_removal(2, &events, &HashSet::new(), &HashMap::from([(10, 5)]));

        assert_eq!(plan.len(), 1);
        assert!(!plan[0].release_seat);
        assert_eq!(
            plan[0].rating,
            Some(RunningMean {
                average: None,
                count: 0
            })
        );
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_delete_user_restores_event_aggregates(pool: PgPool) {
        let organizer = fixtures::insert_user(&pool, "organizer").await;
        let leaving = fixtures::insert_user(&pool, "leaving").await;
        let staying = fixtures::insert_user(&pool, "staying").await;
        let category = fixtures::insert_category(&pool, "Concerts").await;
        let event_id = fixtures::insert_event(&pool, organizer, category, 0).await;

        for (user, value) in [(leaving, 5), (staying, 1)] {
            fixtures::insert_request(&pool, event_id, user, RequestStatus::Confirmed).await;
            fixtures::insert_rating(&pool, event_id, user, value).await;
        }
        sqlx::query(
            "UPDATE events SET confirmed_requests = 2, rating = 3.0, rating_count = 2 WHERE event_id = $1",
        )
        .bind(event_id)
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("UPDATE users SET rating = 3.0 WHERE user_id = $1")
            .bind(organizer)
            .execute(&pool)
            .await
            .unwrap();

        delete_user(&pool, leaving).await.unwrap();

        let (confirmed, rating, count): (i32, Option<f64>, i32) = sqlx::query_as(
            "SELECT confirmed_requests, rating, rating_count FROM events WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(confirmed, 1);
        assert_eq!(rating, Some(1.0));
        assert_eq!(count, 1);

        let organizer_rating: Option<f64> =
            sqlx::query_scalar("SELECT rating FROM users WHERE user_id = $1")
                .bind(organizer)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(organizer_rating, Some(1.0));

        let err = delete_user(&pool, leaving).await.unwrap_err();
        assert!(matches!(err, crate::error::StorageError::NotFound(_)));
    }
}
