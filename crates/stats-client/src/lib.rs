//! Types and HTTP client shared by the statistics service and its callers.

pub mod client;
pub mod dto;
pub mod error;

pub use client::StatsClient;
pub use dto::{EndpointHit, StatsQuery, ViewStats};
pub use error::{Result, StatsClientError};
