//! AeroRelay Server Library
//!
//! Core functionality for the AeroRelay relay:
//! - One shared connection to the upstream aircraft feed
//! - Route table and routing of the four interaction patterns
//! - Switch-to-latest subscriptions for channel sessions
//! - gRPC `Relay` service and health endpoint
//! - Relay event sinks

pub mod events;
pub mod router;
pub mod server;
pub mod upstream;
