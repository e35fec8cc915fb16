//! AeroRelay Protocol Buffers
//!
//! Wire types and gRPC stubs for the AeroRelay API.
//!
//! This crate contains:
//! - `Relay` service: the four client-facing routes
//! - `AircraftStream` service: the upstream aircraft feed
//! - `Weather` and `Aircraft` messages

#![allow(clippy::derive_partial_eq_without_eq)]

pub mod methods;

/// AeroRelay v1 API definitions.
#[allow(non_camel_case_types)]
pub mod v1;

// Re-export v1 as the default API version for convenience
pub use v1::*;

// Re-export prost_types so downstream crates share one Timestamp type
pub use prost_types;
