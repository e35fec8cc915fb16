//! `AeroRelay` Core Library
//!
//! Shared functionality for `AeroRelay` components:
//! - Configuration resolution and hierarchy
//! - Tracing initialisation
//! - Common error types

pub mod config;
pub mod error;
pub mod tracing_init;

pub use config::{RelayConfig, UpstreamConfig};
pub use error::{Error, Result};
