use std::net::SocketAddr;

use anyhow::Context;
use stats_client::StatsClient;
use storage::Database;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod clock;
mod config;
mod error;
mod extract;
mod features;
mod middleware;
mod routes;
mod state;

use config::Config;
use extract::TrustedProxies;
use features::{categories, compilations, events, ratings, requests, users};
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        users::handlers::list_users,
        users::handlers::create_user,
        users::handlers::delete_user,
        categories::handlers::list_categories,
        categories::handlers::get_category,
        categories::handlers::create_category,
        categories::handlers::update_category,
        categories::handlers::delete_category,
        events::handlers::create_event,
        events::handlers::list_user_events,
        events::handlers::get_user_event,
        events::handlers::update_user_event,
        events::handlers::search_admin_events,
        events::handlers::update_admin_event,
        events::handlers::search_public_events,
        events::handlers::get_public_event,
        requests::handlers::list_user_requests,
        requests::handlers::create_request,
        requests::handlers::cancel_request,
        requests::handlers::list_event_requests,
        requests::handlers::update_request_statuses,
        compilations::handlers::list_compilations,
        compilations::handlers::get_compilation,
        compilations::handlers::create_compilation,
        compilations::handlers::update_compilation,
        compilations::handlers::delete_compilation,
        ratings::handlers::rate_event,
        ratings::handlers::remove_rating,
        ratings::handlers::list_rated_events,
    ),
    components(
        schemas(
            error::ApiError,
            storage::dto::user::NewUserRequest,
            storage::dto::user::UserDto,
            storage::dto::user::UserShortDto,
            storage::dto::category::CategoryRequest,
            storage::dto::category::CategoryDto,
            storage::dto::event::LocationDto,
            storage::dto::event::NewEventRequest,
            storage::dto::event::UpdateEventUserRequest,
            storage::dto::event::UpdateEventAdminRequest,
            storage::dto::event::EventFullDto,
            storage::dto::event::EventShortDto,
            storage::dto::event::EventSort,
            storage::dto::request::ParticipationRequestDto,
            storage::dto::request::RequestStatusUpdate,
            storage::dto::request::RequestStatusUpdateResult,
            storage::dto::compilation::NewCompilationRequest,
            storage::dto::compilation::UpdateCompilationRequest,
            storage::dto::compilation::CompilationDto,
            storage::models::EventState,
            storage::models::UserStateAction,
            storage::models::AdminStateAction,
            storage::models::RequestStatus,
        )
    ),
    tags(
        (name = "admin", description = "Administrator endpoints"),
        (name = "categories", description = "Public category endpoints"),
        (name = "events", description = "Public and initiator event endpoints"),
        (name = "requests", description = "Participation request endpoints"),
        (name = "compilations", description = "Public compilation endpoints"),
        (name = "ratings", description = "Event rating endpoints"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting {}", state::APP_NAME);

    let config = Config::from_env().context("Failed to load service configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let stats = StatsClient::new(&config.stats_server_url)
        .context("Failed to build stats client")?;
    tracing::info!("Reporting hits to {}", stats.base_url());

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_disabled() {
        tracing::warn!("API_KEYS is empty, admin endpoints are not protected");
    }

    let proxies = TrustedProxies::parse(&config.trusted_proxies)
        .context("TRUSTED_PROXIES must be a comma separated list of addresses")?;
    if proxies.is_empty() {
        tracing::info!("No trusted proxies, client addresses come from the socket");
    }

    let app = routes::router(AppState { db, stats, proxies }, api_keys)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
