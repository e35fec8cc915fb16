//! Named constants for route names and service paths.
//!
//! These match the route names registered in `build.rs` and are shared
//! between the relay (route table, upstream connector) and the CLI so the
//! wire names stay in one place.

// ---------------------------------------------------------------------------
// Relay service
// ---------------------------------------------------------------------------

/// Fully qualified name of the client-facing relay service.
pub const RELAY_SERVICE: &str = "aerorelay.v1.Relay";

/// `Relay/reqresp`
pub const ROUTE_REQRESP: &str = "reqresp";

/// `Relay/reqstream`
pub const ROUTE_REQSTREAM: &str = "reqstream";

/// `Relay/fireforget`
pub const ROUTE_FIREFORGET: &str = "fireforget";

/// `Relay/channel`
pub const ROUTE_CHANNEL: &str = "channel";

// ---------------------------------------------------------------------------
// AircraftStream service (upstream)
// ---------------------------------------------------------------------------

/// Fully qualified name of the upstream aircraft feed service.
pub const AIRCRAFT_STREAM_SERVICE: &str = "aerorelay.v1.AircraftStream";

/// `AircraftStream/acstream`
pub const ROUTE_ACSTREAM: &str = "acstream";

/// Build the HTTP/2 path for a route on a service, e.g. `/aerorelay.v1.Relay/reqresp`.
pub fn route_path(service: &str, route: &str) -> String {
    format!("/{service}/{route}")
}
