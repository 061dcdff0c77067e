//! Tasks Module
//!
//! Lightweight tasks tracked inside rooms, including conversion of chat
//! messages into tasks.

pub mod handlers;
pub mod service;

pub use handlers::*;
