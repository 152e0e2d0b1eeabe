use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::WebError;

/// Reject requests without a known bearer key. An empty key set disables the check.
pub async fn require_auth(
    State(api_keys): State<ApiKeys>,
    request: Request,
    next: Next,
) -> Result<Response, WebError> {
    if api_keys.is_disabled() {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match token {
        Some(token) if api_keys.is_valid(token) => Ok(next.run(request).await),
        _ => {
            tracing::warn!("Invalid API key attempt on {}", request.uri().path());
            Err(WebError::Unauthorized)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    keys: Arc<HashSet<String>>,
}

impl ApiKeys {
    pub fn from_comma_separated(keys_str: &str) -> Self {
        let keys = keys_str
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self {
            keys: Arc::new(keys),
        }
    }

    pub fn is_valid(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_disabled(&self) -> bool {
        self.keys.is_empty()
    }
}
