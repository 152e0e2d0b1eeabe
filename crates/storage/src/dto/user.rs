use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::common::{comma_separated, not_blank};
use crate::models::User;

/// Request payload for registering a user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewUserRequest {
    #[validate(
        email(message = "Email must be a valid address"),
        length(min = 6, max = 254, message = "Email must be between 6 and 254 characters")
    )]
    pub email: String,

    #[validate(length(min = 2, max = 250, message = "Name must be between 2 and 250 characters"))]
    #[validate(custom(function = "not_blank"))]
    pub name: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    /// Comma separated user ids
    #[serde(default, deserialize_with = "comma_separated")]
    #[param(value_type = Option<String>)]
    pub ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserShortDto {
    pub id: i64,
    pub name: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.user_id,
            email: user.email,
            name: user.name,
            rating: user.rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_email() {
        let req = NewUserRequest {
            email: "not-an-email".to_string(),
            name: "Alice".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_rejects_short_name() {
        let req = NewUserRequest {
            email: "alice@example.com".to_string(),
            name: "A".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_rejects_blank_name() {
        let req = NewUserRequest {
            email: "alice@example.com".to_string(),
            name: "    ".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.field_errors()["name"][0].code, "blank");
    }

    #[test]
    fn test_accepts_valid_user() {
        let req = NewUserRequest {
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
