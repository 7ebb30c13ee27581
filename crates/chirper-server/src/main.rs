mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use chirper_api::auth::AppStateInner;
use chirper_core::events::EventBus;
use chirper_core::notifications;
use chirper_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirper=debug,chirper_api=debug,chirper_core=debug,chirper_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);

    // Chirp events feed the notifier independently of request handling
    let events = EventBus::default();
    tokio::spawn(notifications::run(db.clone(), events.subscribe()));

    let state = AppStateInner::new(db, events, config.jwt_secret);

    let app = chirper_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Chirper listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
