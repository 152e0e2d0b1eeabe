use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::common::not_blank;
use super::event::EventShortDto;
use crate::models::Compilation;

/// Request payload for creating a compilation
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewCompilationRequest {
    #[serde(default)]
    pub pinned: bool,

    #[validate(length(min = 1, max = 50, message = "Title must be between 1 and 50 characters"))]
    #[validate(custom(function = "not_blank"))]
    pub title: String,

    #[serde(default)]
    pub events: Vec<i64>,
}

/// Request payload for updating a compilation; `events` replaces the set when present
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCompilationRequest {
    pub pinned: Option<bool>,

    #[validate(length(min = 1, max = 50, message = "Title must be between 1 and 50 characters"))]
    #[validate(custom(function = "not_blank"))]
    pub title: Option<String>,

    pub events: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompilationFilter {
    pub pinned: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompilationDto {
    pub id: i64,
    pub pinned: bool,
    pub title: String,
    pub events: Vec<EventShortDto>,
}

impl CompilationDto {
    pub fn new(compilation: Compilation, events: Vec<EventShortDto>) -> Self {
        Self {
            id: compilation.compilation_id,
            pinned: compilation.pinned,
            title: compilation.title,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_is_rejected() {
        let req: NewCompilationRequest = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(!req.pinned);
        assert!(req.events.is_empty());
    }

    #[test]
    fn test_update_checks_title_only_when_present() {
        let req = UpdateCompilationRequest {
            pinned: Some(true),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        let req = UpdateCompilationRequest {
            title: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
