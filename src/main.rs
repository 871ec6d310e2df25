//! flowinvest-gateway server entry point.
//!
//! Starts the Axum HTTP server after wiring the store, the external
//! clients, and the services into the shared application state.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use flowinvest_gateway::api;
use flowinvest_gateway::app_state::AppState;
use flowinvest_gateway::clients::{AiClient, CapitalistClient, SheetsClient};
use flowinvest_gateway::config::GatewayConfig;
use flowinvest_gateway::persistence::PgStore;
use flowinvest_gateway::service::{
    ChatService, FeedService, LedgerService, ProfileService, SheetsSyncService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting flowinvest-gateway");

    // Database pool and migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;
    let store = Arc::new(PgStore::new(pool));

    // External clients
    let capitalist = Arc::new(CapitalistClient::new(&config.capitalist)?);
    let ai = Arc::new(AiClient::new(config.ai.clone())?);
    let sheets = Arc::new(SheetsClient::new(config.sheets.clone())?);

    // Services
    let ledger = Arc::new(LedgerService::new(Arc::clone(&store), capitalist));
    let chat = Arc::new(ChatService::new(Arc::clone(&store), Arc::clone(&ai)));
    let feed = Arc::new(FeedService::new(Arc::clone(&store), ai));
    let profiles = Arc::new(ProfileService::new(Arc::clone(&store)));
    let sheets_sync = Arc::new(SheetsSyncService::new(
        store,
        sheets,
        config.sheets.clone(),
    ));

    // Optional scheduled sync
    if config.sheets.sync_interval_secs > 0 {
        let interval = Duration::from_secs(config.sheets.sync_interval_secs);
        tokio::spawn(Arc::clone(&sheets_sync).run_forever(interval));
        tracing::info!(every_secs = config.sheets.sync_interval_secs, "sheets sync scheduled");
    }

    // Build application state
    let app_state = AppState {
        ledger,
        chat,
        feed,
        profiles,
        sheets_sync,
    };

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
