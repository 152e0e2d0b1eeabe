use axum::extract::FromRef;
use stats_client::StatsClient;
use storage::Database;

use crate::extract::TrustedProxies;

/// Name under which this service reports hits.
pub const APP_NAME: &str = "ewm-main-service";

#[derive(Debug, Clone, FromRef)]
pub struct AppState {
    pub db: Database,
    pub stats: StatsClient,
    pub proxies: TrustedProxies,
}
