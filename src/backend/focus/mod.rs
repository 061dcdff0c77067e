//! Focus Module
//!
//! Focus sessions: a principal starts one, stops it, and reviews the most
//! recent ones. Messages sent while a session is active are counted by the
//! chat path.

pub mod handlers;
pub mod service;

pub use handlers::*;
