//! Core types, traits, and error definitions for tendero.
//!
//! This crate provides the foundational building blocks shared across the
//! gateway: the immutable application configuration, the error type, the
//! request-scoped data model, and the service traits the HTTP layer is
//! wired against.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
