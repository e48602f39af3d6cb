//! Droplan API Library
//!
//! This crate provides the HTTP transfer endpoint: handlers, routes, state,
//! and application setup for the LAN file-sharing registry.

// Module declarations
mod handlers;
mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::ErrorResponse;
pub use telemetry::init_tracing;
