//! Cardápio Bot - WhatsApp ordering assistant
//!
//! Customers browse the menu, fill a cart and place delivery orders by
//! chatting; the kitchen is notified of every new order.

mod api;
mod config;
mod db;
mod messaging;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::BotConfig;
use db::Database;
use messaging::TwilioClient;
use runtime::{DatabaseStorage, RuntimeManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardapio_bot=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    if let Some(seed) = &config.menu_seed {
        let count = db.seed_menu_from_file(seed)?;
        tracing::info!(path = %seed.display(), items = count, "Menu seeded");
    }

    if config.kitchen_number.is_none() {
        tracing::warn!("KITCHEN_WHATSAPP_NUMBER not set; kitchen notifications disabled");
    }

    let sender = TwilioClient::new(config.twilio.clone())?;
    let manager = RuntimeManager::new(
        Arc::new(DatabaseStorage::new(db)),
        Arc::new(sender),
        config.kitchen_number.clone(),
        config.idle_timeout,
    );
    let state = AppState::new(manager);

    let app = create_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Cardápio bot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
