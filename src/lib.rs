//! Promodesk backend — library crate.
//!
//! The binary in `main.rs` only adds CLI parsing and server wiring;
//! everything else, including the dashboard API router, lives here so
//! integration tests in `tests/` can drive it.

pub mod api;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod models;
pub mod registry;
pub mod store;
pub mod vault;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub registry: registry::CredentialRegistry,
    pub config: config::Config,
}
