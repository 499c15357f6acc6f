//! HTTP entry point for tendero.
//!
//! This crate provides the axum server, the request handlers for the
//! chat/voice/vision/catalog endpoints, and the error-to-status mapping.

pub mod logging;
pub mod server;

pub use logging::init_tracing;
pub use server::{AppState, GatewayServer};
