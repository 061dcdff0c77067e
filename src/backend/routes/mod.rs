//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Architecture
//!
//! - **`router`** - Main router creation, service routes and layers
//! - **`api_routes`** - REST endpoints for rooms, tasks and messages
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! └── api_routes.rs   - API endpoint routes
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use huddle::backend::routes::create_router;
//! use huddle::backend::server::state::AppState;
//! use huddle::backend::store::MemoryStore;
//! use huddle::shared::AppConfig;
//!
//! let state = AppState::new(AppConfig::default(), Arc::new(MemoryStore::new()));
//! let router = create_router(state);
//! ```

/// Main router creation
pub mod router;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
