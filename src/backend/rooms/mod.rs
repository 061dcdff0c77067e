//! Rooms Module
//!
//! Role-gated project rooms: creation, listing, entry, participant changes,
//! archiving and deletion.
//!
//! - **`service`** - Room operations against the store and the realtime hub
//! - **`handlers`** - HTTP handlers
//!
//! Access checks go through `access::can_access`, the same policy the
//! WebSocket join path uses, so the two can never disagree.

pub mod handlers;
pub mod service;

pub use handlers::*;
