use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::datetime;
use crate::models::{ParticipationRequest, RequestStatus};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipationRequestDto {
    pub id: i64,
    #[serde(with = "datetime")]
    #[schema(value_type = String)]
    pub created: NaiveDateTime,
    pub event: i64,
    pub requester: i64,
    pub status: RequestStatus,
}

impl From<ParticipationRequest> for ParticipationRequestDto {
    fn from(request: ParticipationRequest) -> Self {
        Self {
            id: request.request_id,
            created: request.created,
            event: request.event_id,
            requester: request.requester_id,
            status: request.status,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct NewRequestParams {
    pub event_id: i64,
}

/// Owner decision over a batch of pending requests
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatusUpdate {
    pub request_ids: Vec<i64>,
    pub status: RequestStatus,
}

impl RequestStatusUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if self.request_ids.is_empty() {
            return Err("No requests to update".to_string());
        }
        match self.status {
            RequestStatus::Confirmed | RequestStatus::Rejected => Ok(()),
            other => Err(format!(
                "Status must be CONFIRMED or REJECTED, got {}",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatusUpdateResult {
    pub confirmed_requests: Vec<ParticipationRequestDto>,
    pub rejected_requests: Vec<ParticipationRequestDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_update_requires_decision() {
        let update: RequestStatusUpdate =
            serde_json::from_str(r#"{"requestIds": [1, 2], "status": "CANCELED"}"#).unwrap();
        assert!(update.validate().is_err());

        let update: RequestStatusUpdate =
            serde_json::from_str(r#"{"requestIds": [], "status": "CONFIRMED"}"#).unwrap();
        assert!(update.validate().is_err());

        let update: RequestStatusUpdate =
            serde_json::from_str(r#"{"requestIds": [4], "status": "REJECTED"}"#).unwrap();
        assert!(update.validate().is_ok());
    }
}
