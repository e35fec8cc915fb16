//! AeroRelay CLI Library
//!
//! Command-line client for the AeroRelay relay: one subcommand per route,
//! plus a simulated upstream aircraft feed for local demos.

pub mod connection;
pub mod feed;
pub mod route_cmd;
