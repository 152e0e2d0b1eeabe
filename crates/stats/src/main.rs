use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod extract;
mod handlers;
mod repository;
mod routes;

use config::Config;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::record_hit, handlers::get_stats),
    components(schemas(
        error::ApiError,
        stats_client::EndpointHit,
        stats_client::ViewStats,
    )),
    tags((name = "stats", description = "Endpoint hit statistics"))
)]
struct ApiDoc;

async fn run_migrations(pool: &PgPool) -> error::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
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

    tracing::info!("Starting stats service");

    let config = Config::from_env().context("Failed to load stats configuration")?;

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to initialize database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let app = routes::router(pool)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
