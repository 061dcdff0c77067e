//! Huddle - Main Library
//!
//! Huddle is a real-time collaboration service combining direct messaging,
//! role-gated project rooms and lightweight task tracking, with live presence
//! and typing indicators delivered over persistent WebSocket connections.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between the server and its clients
//!   - Identifiers, principals, rooms, tasks, messages
//!   - Channel keys and wire events
//!   - Error and configuration types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Access policy, connection registry, channel membership
//!   - Event relay, presence publishing, session bootstrap
//!   - Room, task and message request handlers
//!   - Persisted-entity store (in-memory and PostgreSQL)
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server-side code (on by default)
//!
//! # Usage
//!
//! ```rust,no_run
//! use huddle::backend::server::init::create_app;
//! use huddle::shared::AppConfig;
//!
//! # async fn example() {
//! let app = create_app(AppConfig::default()).await;
//! // Serve with axum::serve
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The connection registry is a pair of `DashMap`s locked per key, each
//! connection's joined-channel set sits behind its own `RwLock`, and events
//! reach sockets through bounded per-connection `mpsc` queues.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
