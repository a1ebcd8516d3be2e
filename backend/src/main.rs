use axum::http::{HeaderValue, Method};
use duo::{
    Config, get_db_pool,
    db::PgStore,
    handlers::{self, AppState},
    notifications::notifier_from_config,
    utils,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let db_config = duo::db::DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    // Run migrations
    duo::db::migrations::run_migrations(&pool).await?;

    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
        notifier: notifier_from_config(&config)?,
        schedule: config.schedule(),
    };

    let port = config.port;
    let app = handlers::router(state).layer(create_cors_layer());

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {} (day boundaries in {})", port, config.timezone);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_cors_layer() -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    // ALLOWED_ORIGINS is a comma-separated list of origins
    if let Ok(cors_origins) = std::env::var("ALLOWED_ORIGINS") {
        let origins: Vec<HeaderValue> = cors_origins
            .split(',')
            .filter_map(|origin| {
                let trimmed = origin.trim();
                if !trimmed.is_empty() {
                    trimmed.parse().ok()
                } else {
                    None
                }
            })
            .collect();

        if !origins.is_empty() {
            cors = cors.allow_origin(origins);
        } else {
            cors = cors.allow_origin(Any);
        }
    } else {
        // Default to permissive for development
        cors = cors.allow_origin(Any);
    }

    cors
}
