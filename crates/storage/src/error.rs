use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    NotFound(String),

    /// A business rule rejected the operation (state, ownership, capacity).
    #[error("{0}")]
    Conflict(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn not_found(entity: &str, id: i64) -> Self {
        Self::NotFound(format!("{} with id={} was not found.", entity, id))
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }

    /// Turn unique/foreign key violations into `ConstraintViolation`, leaving
    /// every other error untouched.
    pub fn map_constraint(self, message: &str) -> Self {
        if self.is_unique_violation() || self.is_foreign_key_violation() {
            Self::ConstraintViolation(message.to_string())
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StorageError::not_found("Event", 42);
        assert_eq!(err.to_string(), "Event with id=42 was not found.");
    }

    #[test]
    fn test_map_constraint_keeps_other_errors() {
        let err = StorageError::Conflict("nope".to_string()).map_constraint("dup");
        assert!(matches!(err, StorageError::Conflict(msg) if msg == "nope"));
    }
}
