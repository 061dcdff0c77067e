//! Authentication Module
//!
//! Token handling for the HTTP API and the WebSocket upgrade. Password
//! hashing and login live in an external identity service; this module only
//! verifies the tokens it issues.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! └── sessions.rs     - JWT token management
//! ```
//!
//! # Authentication Flow
//!
//! 1. A token is issued for a principal (`create_token`)
//! 2. Clients send it as `Authorization: Bearer <token>` or `?token=` on `/ws`
//! 3. `verify_token` checks signature and expiry and yields the claims
//! 4. The `AuthUser` extractor resolves the claims to a stored principal

/// JWT token generation and validation
pub mod sessions;

pub use sessions::{create_token, verify_token, Claims};
