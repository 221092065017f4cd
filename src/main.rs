mod cleanup;
mod config;
mod db;
mod error;
mod game;
mod models;
mod push;
mod registry;
mod relay;
mod routes;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use config::Config;
use registry::GameRegistry;
use relay::EventRelay;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across all handlers
pub struct AppState {
    pub db: Option<PgPool>,
    pub registry: Arc<GameRegistry>,
    pub relay: Arc<EventRelay>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tictac_live_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting tic-tac-toe live backend...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Connect to the statistics store, when one is configured. Game
    // state itself is in-memory only and needs no database.
    let db = match config.database.url.as_deref() {
        Some(url) => {
            let pool = db::create_pool(url, config.database.max_connections).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Connected to database, migrations completed");
            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; win/loss statistics are disabled");
            None
        }
    };

    // Create shared HTTP client for reusing connections
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let relay = Arc::new(EventRelay::new());
    let gateway = push::BroadcastGateway::new(
        http_client,
        config.push.endpoint.clone(),
        config.push.api_key.clone(),
    );
    let registry = Arc::new(GameRegistry::new(relay.clone(), gateway.clone(), db.clone()));

    // Spawn background task evicting idle games and stale users
    let presence_cleanup = cleanup::PresenceCleanup::new(
        registry.clone(),
        relay.clone(),
        gateway,
        &config.cleanup,
    );
    tokio::spawn(presence_cleanup.run());

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let addr = config.server_addr();

    // Create application state
    let state = Arc::new(AppState { db, registry, relay });

    // Build router
    let app = routes::create_routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
