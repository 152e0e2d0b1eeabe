use axum::extract::{FromRequest, FromRequestParts, Query};

use crate::error::StatsError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(StatsError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(StatsError))]
pub struct AppQuery<T>(pub T);
