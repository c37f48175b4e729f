//! Taleroom relay server entry point.

use std::error::Error;
use std::sync::Arc;

use taleroom_api::config::Config;
use taleroom_api::routes;
use taleroom_api::state::AppState;
use taleroom_core::ids::RandomIdGenerator;
use taleroom_rooms::RoomRegistry;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env file is fine; the process environment still applies.
    let dotenv = dotenvy::dotenv();

    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Taleroom relay server");
    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "loaded environment file");
    }

    // Read configuration from environment.
    let config = Config::from_env()?;
    tracing::info!(
        model = %config.narrator.model,
        base_url = %config.narrator.base_url,
        timeout_secs = config.narrator.timeout.as_secs(),
        "narrator configured"
    );

    // Build application state.
    let narrator = config.narrator_client()?;
    let registry = RoomRegistry::new(Arc::new(RandomIdGenerator));
    let app_state = AppState::new(
        Arc::new(registry),
        Arc::new(narrator),
        config.narrator.timeout,
    );

    // Build router.
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(config.cors_layer()?)
        .with_state(app_state);

    // Start server.
    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
