/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The validated configuration
 * - The persisted-entity store
 * - The realtime hub (registry, membership, relay, presence)
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`.
 *
 * # Example
 *
 * ```rust,no_run
 * use huddle::backend::server::state::AppState;
 * use axum::extract::State;
 *
 * async fn handler(State(state): State<AppState>) -> String {
 *     state.realtime.registry().connection_count().to_string()
 * }
 * ```
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::realtime::RealtimeHub;
use crate::backend::store::Store;
use crate::shared::AppConfig;

/// Application state shared by every handler and socket
///
/// Every field is cheap to clone: the config and store sit behind `Arc`s
/// and the hub is itself a bundle of `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Validated configuration
    pub config: Arc<AppConfig>,

    /// Persisted-entity store (PostgreSQL or in-memory)
    pub store: Arc<dyn Store>,

    /// Realtime core shared with every WebSocket session
    pub realtime: RealtimeHub,
}

impl AppState {
    /// Assemble the state around a store
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let realtime = RealtimeHub::new(Arc::clone(&store), config.realtime.clone());
        Self {
            config: Arc::new(config),
            store,
            realtime,
        }
    }
}

/// Extract the realtime hub from `AppState`
impl FromRef<AppState> for RealtimeHub {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.realtime.clone()
    }
}

/// Extract the store from `AppState`
impl FromRef<AppState> for Arc<dyn Store> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.store)
    }
}

/// Extract the configuration from `AppState`
impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}
