//! The single outbound connection to the upstream aircraft feed.

pub mod connector;

pub use connector::{
    AircraftSource, AircraftStream, RouteRequest, RouteSpec, UpstreamConnector, UpstreamError,
};
