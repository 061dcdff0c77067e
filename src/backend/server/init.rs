/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including store loading, state creation and route configuration.
 *
 * # Initialization Process
 *
 * 1. Open the store (PostgreSQL or in-memory) and seed principals
 * 2. Build the realtime hub and application state
 * 3. Create and configure the router
 * 4. Start the periodic connection statistics task
 */

use axum::Router;
use std::time::Duration;

use crate::backend::realtime::RealtimeHub;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_store;
use crate::backend::server::state::AppState;
use crate::shared::AppConfig;

/// How often connection statistics are logged
const STATS_INTERVAL: Duration = Duration::from_secs(300);

/// Open the store and assemble `AppState`
pub async fn build_app_state(config: AppConfig) -> AppState {
    let store = load_store(&config).await;
    AppState::new(config, store)
}

/// Create and configure the Axum application
///
/// The configuration is expected to be validated already (`load_config`
/// and `AppConfigBuilder::build` both do this).
pub async fn create_app(config: AppConfig) -> Router<()> {
    tracing::info!("[Server] Initializing Huddle backend server");

    let app_state = build_app_state(config).await;
    spawn_stats_task(app_state.realtime.clone());

    let app = create_router(app_state);
    tracing::info!("[Server] Router configured");
    app
}

fn spawn_stats_task(hub: RealtimeHub) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATS_INTERVAL);
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            tracing::info!(
                "[Server] {} open connections, {} principals online",
                hub.registry().connection_count(),
                hub.registry().online_count()
            );
        }
    });
}
