use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chasse::{
    abuse, api, auth, broadcast,
    catalog::Catalog,
    config::HuntConfig,
    state::AppState,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chasse=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Chasse...");

    let config = match HuntConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let catalog = match Catalog::load(&config) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("Failed to load hunt pack: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Loaded pack {:?} ({}) with {} stages",
        catalog.name(),
        catalog.title(),
        catalog.total_stages()
    );

    let abuse_config = match abuse::AbuseConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let auth_config = Arc::new(auth::AuthConfig::from_env());

    let state = Arc::new(
        AppState::new(catalog, config.rules.clone()).with_answer_limiter(abuse_config.answer_limiter),
    );

    broadcast::spawn_leaderboard_broadcaster(state.clone());
    broadcast::spawn_rate_limit_cleanup(state.clone());

    let app = api::build_router(state, auth_config, &config.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
