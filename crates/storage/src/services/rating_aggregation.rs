use sqlx::PgPool;
use tracing::info;

use crate::error::{Result, StorageError};
use crate::models::Event;
use crate::repository::event as event_repo;
use crate::repository::rating as rating_repo;
use crate::repository::request as request_repo;
use crate::repository::user::{self as user_repo, UserRepository};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Incrementally maintained average over a multiset of ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningMean {
    pub average: Option<f64>,
    pub count: i32,
}

impl RunningMean {
    pub fn of(event: &Event) -> Self {
        Self {
            average: event.rating,
            count: event.rating_count,
        }
    }

    pub fn add(self, value: i32) -> Self {
        let n = f64::from(self.count);
        let average = self.average.unwrap_or(0.0);
        Self {
            average: Some((average * n + f64::from(value)) / (n + 1.0)),
            count: self.count + 1,
        }
    }

    pub fn replace(self, old: i32, new: i32) -> Self {
        match self.average {
            Some(average) if self.count > 0 => Self {
                average: Some(average + f64::from(new - old) / f64::from(self.count)),
                count: self.count,
            },
            _ => Self { average: None, count: 0 }.add(new),
        }
    }

    pub fn remove(self, value: i32) -> Self {
        match self.average {
            Some(average) if self.count > 1 => {
                let n = f64::from(self.count);
                Self {
                    average: Some((average * n - f64::from(value)) / (n - 1.0)),
                    count: self.count - 1,
                }
            }
            _ => Self {
                average: None,
                count: 0,
            },
        }
    }
}

pub fn validate_rating(value: i32) -> Result<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(StorageError::InvalidInput(format!(
            "Rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, value
        )));
    }
    Ok(())
}

/// Store the user's rating for an event, replacing a previous one, and
/// refresh the event and organizer averages.
pub async fn rate_event(pool: &PgPool, user_id: i64, event_id: i64, value: i32) -> Result<()> {
    validate_rating(value)?;
    UserRepository::new(pool).ensure_exists(user_id).await?;

    let mut tx = pool.begin().await?;

    let event = event_repo::lock_event(&mut tx, event_id).await?;
    if !request_repo::is_confirmed_participant(&mut tx, user_id, event_id).await? {
        return Err(StorageError::Conflict(
            "Only confirmed participants can rate the event".to_string(),
        ));
    }

    let mean = RunningMean::of(&event);
    let mean = match rating_repo::lock_rating(&mut tx, user_id, event_id).await? {
        Some(existing) if existing.value == value => mean,
        Some(existing) => {
            rating_repo::update_value(&mut tx, existing.rating_id, value).await?;
            mean.replace(existing.value, value)
        }
        None => {
            rating_repo::insert(&mut tx, user_id, event_id, value).await?;
            mean.add(value)
        }
    };

    event_repo::set_rating(&mut tx, event_id, mean.average, mean.count).await?;
    user_repo::refresh_rating(&mut tx, event.initiator_id).await?;

    tx.commit().await?;

    info!("User {} rated event {} with {}", user_id, event_id, value);

    Ok(())
}

/// Drop the user's rating for an event and refresh the averages.
pub async fn remove_rating(pool: &PgPool, user_id: i64, event_id: i64) -> Result<()> {
    UserRepository::new(pool).ensure_exists(user_id).await?;

    let mut tx = pool.begin().await?;

    let event = event_repo::lock_event(&mut tx, event_id).await?;
    let rating = rating_repo::lock_rating(&mut tx, user_id, event_id)
        .await?
        .ok_or_else(|| {
            StorageError::NotFound(format!(
                "Rating of user id={} for event id={} was not found.",
                user_id, event_id
            ))
        })?;

    rating_repo::delete(&mut tx, rating.rating_id).await?;

    let mean = RunningMean::of(&event).remove(rating.value);
    event_repo::set_rating(&mut tx, event_id, mean.average, mean.count).await?;
    user_repo::refresh_rating(&mut tx, event.initiator_id).await?;

    tx.commit().await?;

    info!("User {} removed rating for event {}", user_id, event_id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> RunningMean {
        RunningMean {
            average: None,
            count: 0,
        }
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("average should be set");
        assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
    }

    #[test]
    fn test_add_keeps_true_mean() {
        let mean = empty().add(5).add(3).add(4);
        assert_eq!(mean.count, 3);
        assert_close(mean.average, 4.0);
    }

    #[test]
    fn test_replace_adjusts_mean() {
        let mean = empty().add(5).add(3).replace(3, 1);
        assert_eq!(mean.count, 2);
        assert_close(mean.average, 3.0);
    }

    #[test]
    fn test_remove_back_to_empty() {
        let mean = empty().add(2).add(4);
        let mean = mean.remove(4);
        assert_eq!(mean.count, 1);
        assert_close(mean.average, 2.0);

        let mean = mean.remove(2);
        assert_eq!(mean, empty());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(matches!(validate_rating(0), Err(StorageError::InvalidInput(_))));
        assert!(validate_rating(6).is_err());
    }
}
