//! Middleware Module
//!
//! Request processing shared by the HTTP handlers.
//!
//! - **`auth`** - Bearer token parsing and the `AuthUser` extractor
//!
//! # Example
//!
//! ```rust,no_run
//! use huddle::backend::middleware::AuthUser;
//!
//! async fn whoami(AuthUser(principal): AuthUser) -> String {
//!     principal.display_name
//! }
//! ```

pub mod auth;

pub use auth::{bearer_token, AuthUser};
