//! Real-time Module
//!
//! The messaging and presence core: who is connected, which channels each
//! connection has joined, and how events fan out to them.
//!
//! # Architecture
//!
//! The realtime module is organized into focused submodules, leaf first:
//!
//! - **`registry`** - Connection registry (principal to connections)
//! - **`relay`** - Event relay (channel fan-out and broadcast)
//! - **`membership`** - Channel joins, checked with the access policy
//! - **`presence`** - Online/offline marking and announcements
//! - **`hub`** - Bundles the above around one store
//! - **`session`** - Per-connection state machine (setup, joins, relays)
//! - **`socket`** - Axum WebSocket transport
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── registry.rs     - ConnectionRegistry, Connection
//! ├── relay.rs        - EventRelay
//! ├── membership.rs   - ChannelMembership
//! ├── presence.rs     - PresencePublisher
//! ├── hub.rs          - RealtimeHub
//! ├── session.rs      - Session, SessionState
//! └── socket.rs       - GET /ws handler
//! ```
//!
//! # Control Flow
//!
//! A client opens `/ws`, sends `setup` with its principal id, then asks to
//! join channels. Room joins consult the access policy through the store.
//! Events published afterwards reach only connections joined to the same
//! channel; presence changes and room deletions reach everyone.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use huddle::backend::realtime::{RealtimeHub, Session};
//! use huddle::backend::store::MemoryStore;
//! use huddle::shared::config::RealtimeSettings;
//!
//! # async fn example() {
//! let hub = RealtimeHub::new(Arc::new(MemoryStore::new()), RealtimeSettings::default());
//! let (tx, _rx) = hub.outbound_channel();
//! let mut session = Session::open(&hub, tx, None);
//! session.close().await;
//! # }
//! ```

/// Connection registry
pub mod registry;

/// Event relay
pub mod relay;

/// Channel membership
pub mod membership;

/// Presence publishing
pub mod presence;

/// Component bundle
pub mod hub;

/// Session bootstrap state machine
pub mod session;

/// WebSocket transport
pub mod socket;

// Re-export commonly used types and functions
pub use hub::RealtimeHub;
pub use membership::{ChannelMembership, DenyReason, JoinOutcome};
pub use presence::PresencePublisher;
pub use registry::{Connection, ConnectionRegistry, Unregistered};
pub use relay::EventRelay;
pub use session::{Session, SessionState};
pub use socket::ws_handler;
