//! The relay's route table.

use std::fmt;
use std::str::FromStr;

use aerorelay_proto::methods::{ROUTE_CHANNEL, ROUTE_FIREFORGET, ROUTE_REQRESP, ROUTE_REQSTREAM};

/// Interaction shape of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionPattern {
    /// One request, one response.
    RequestResponse,
    /// One request, a stream of responses.
    RequestStream,
    /// One request, acknowledgment only.
    FireAndForget,
    /// A stream of requests, a stream of responses.
    Channel,
}

/// A named entry point of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    ReqResp,
    ReqStream,
    FireForget,
    Channel,
}

impl Route {
    pub const ALL: [Self; 4] = [Self::ReqResp, Self::ReqStream, Self::FireForget, Self::Channel];

    /// Wire name of the route.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReqResp => ROUTE_REQRESP,
            Self::ReqStream => ROUTE_REQSTREAM,
            Self::FireForget => ROUTE_FIREFORGET,
            Self::Channel => ROUTE_CHANNEL,
        }
    }

    pub const fn pattern(self) -> InteractionPattern {
        match self {
            Self::ReqResp => InteractionPattern::RequestResponse,
            Self::ReqStream => InteractionPattern::RequestStream,
            Self::FireForget => InteractionPattern::FireAndForget,
            Self::Channel => InteractionPattern::Channel,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown route: {0}")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|route| route.name() == s)
            .ok_or_else(|| UnknownRoute(s.to_string()))
    }
}
