//! Request routing from the relay's inbound routes to the upstream feed.

mod forwarder;
mod routes;
mod switch_latest;

pub use forwarder::{RelayError, RelayRouter, timestamp_now};
pub use routes::{InteractionPattern, Route, UnknownRoute};
