use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::common::not_blank;
use crate::models::Category;

/// Request payload for creating or renaming a category
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    #[validate(custom(function = "not_blank"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.category_id,
            name: category.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_rules() {
        let ok = CategoryRequest {
            name: "Concerts".to_string(),
        };
        assert!(ok.validate().is_ok());

        let blank = CategoryRequest {
            name: "  ".to_string(),
        };
        assert!(blank.validate().unwrap_err().field_errors().contains_key("name"));

        let long = CategoryRequest {
            name: "x".repeat(51),
        };
        assert!(long.validate().is_err());
    }
}
