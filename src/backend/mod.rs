//! Backend Module
//!
//! This module contains all server-side code for Huddle: the realtime
//! collaboration core and the HTTP request path around it.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`access`** - Room access policy shared by HTTP and WebSocket paths
//! - **`store`** - Persisted-entity store (PostgreSQL or in-memory)
//! - **`realtime`** - Connection registry, channel membership, event relay,
//!   presence, session bootstrap and the WebSocket transport
//! - **`rooms`** - Room request path
//! - **`tasks`** - Task request path
//! - **`chat`** - Message and conversation request path
//! - **`focus`** - Focus session request path
//! - **`auth`** - JWT verification
//! - **`middleware`** - `AuthUser` extractor
//! - **`error`** - Backend error type and HTTP conversion
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - Router assembly
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── access/         - Access policy
//! ├── store/          - Store trait, MemoryStore, PgStore
//! ├── realtime/       - Realtime core and WebSocket transport
//! ├── rooms/          - Room handlers
//! ├── tasks/          - Task handlers
//! ├── chat/           - Message and conversation handlers
//! ├── focus/          - Focus session handlers
//! ├── auth/           - Tokens
//! ├── middleware/     - Request extractors
//! ├── error/          - Error types
//! ├── server/         - Server initialization and state
//! └── routes/         - Route configuration
//! ```
//!
//! # Thread Safety
//!
//! - The connection registry is a pair of `DashMap`s locked per key
//! - Each connection's joined-channel set has its own `parking_lot::RwLock`
//! - Events reach sockets through bounded `tokio::sync::mpsc` queues
//! - The store is shared as `Arc<dyn Store>`
//!
//! # Error Handling
//!
//! Handlers return `Result<_, BackendError>`, which renders as JSON with the
//! mapped status code. The realtime path never fails a connection on store
//! errors; it logs them and reports denials to the requester.

/// Room access policy
pub mod access;

/// Persisted-entity store
pub mod store;

/// Realtime collaboration core
pub mod realtime;

/// Room request path
pub mod rooms;

/// Task request path
pub mod tasks;

/// Message request path
pub mod chat;

/// Focus session request path
pub mod focus;

/// JWT token handling
pub mod auth;

/// Request extractors
pub mod middleware;

/// Backend error types
pub mod error;

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

// Re-export commonly used types
pub use error::BackendError;
pub use realtime::RealtimeHub;
pub use server::{create_app, AppState};
pub use store::{MemoryStore, PgStore, Store};
