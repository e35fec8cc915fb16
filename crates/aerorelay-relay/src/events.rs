//! Relay event sink.
//!
//! The router reports what passes through it to an injected [`EventSink`]
//! instead of writing to a global output, so tests can observe events
//! without capturing process output.

use std::sync::{Mutex, PoisonError};

use prost_types::Timestamp;
use tracing::info;

use aerorelay_proto::v1::Weather;

use crate::router::Route;

/// Something the relay observed on an inbound route.
#[derive(Debug, Clone, Copy)]
pub enum RelayEvent<'a> {
    /// A request/response or request/stream call delivered its timestamp.
    TimestampReceived {
        route: Route,
        session_id: &'a str,
        at: &'a Timestamp,
    },
    /// A fire-and-forget call or channel element delivered a weather observation.
    WeatherReceived {
        route: Route,
        session_id: &'a str,
        weather: &'a Weather,
    },
    /// A channel session subscribed to its inbound weather feed.
    WeatherFeedSubscribed { session_id: &'a str },
}

impl RelayEvent<'_> {
    /// Short distinguishing tag, one per call site.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::TimestampReceived { .. } => "⏱",
            Self::WeatherReceived {
                route: Route::Channel,
                ..
            } => "☀️",
            Self::WeatherReceived { .. } => "🌧",
            Self::WeatherFeedSubscribed { .. } => "SUBSCRIBED TO WEATHER FEED!",
        }
    }

    pub const fn route(&self) -> Route {
        match self {
            Self::TimestampReceived { route, .. } | Self::WeatherReceived { route, .. } => *route,
            Self::WeatherFeedSubscribed { .. } => Route::Channel,
        }
    }

    pub const fn session_id(&self) -> &str {
        match self {
            Self::TimestampReceived { session_id, .. }
            | Self::WeatherReceived { session_id, .. }
            | Self::WeatherFeedSubscribed { session_id } => *session_id,
        }
    }

    /// Textual form of the observed value; empty for subscription events.
    pub fn value(&self) -> String {
        match self {
            Self::TimestampReceived { at, .. } => at.to_string(),
            Self::WeatherReceived { weather, .. } => weather.to_string(),
            Self::WeatherFeedSubscribed { .. } => String::new(),
        }
    }
}

/// Side-effect-only observer of relay events. Must not fail.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &RelayEvent<'_>);
}

/// Emits each event as an `info` tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: &RelayEvent<'_>) {
        info!(
            tag = event.tag(),
            route = %event.route(),
            session_id = event.session_id(),
            value = %event.value(),
            "Relay event"
        );
    }
}

/// An owned copy of a recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub tag: &'static str,
    pub route: Route,
    pub session_id: String,
    pub value: String,
}

impl From<&RelayEvent<'_>> for RecordedEvent {
    fn from(event: &RelayEvent<'_>) -> Self {
        Self {
            tag: event.tag(),
            route: event.route(),
            session_id: event.session_id().to_string(),
            value: event.value(),
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.events().into_iter().map(|e| e.tag).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn record(&self, event: &RelayEvent<'_>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEvent::from(event));
    }
}
