//! Shared test helpers for the router and relay service tests.
//!
//! [`ScriptedSource`] stands in for the upstream feed: each call to
//! `aircraft_stream` plays the next [`Script`], and every stream it hands
//! out is counted as live until dropped.
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use prost_types::Timestamp;
use tokio::sync::mpsc;
use tokio::time::Sleep;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tonic::{Code, Status};

use aerorelay_proto::v1::{Aircraft, Weather};

use crate::events::{EventSink, RecordingEventSink};
use crate::router::RelayRouter;
use crate::upstream::{AircraftSource, AircraftStream, UpstreamError};

/// What one upstream subscription does.
#[derive(Debug, Clone)]
pub enum Script {
    /// Emit `items` (the first after `first_delay`), then complete or stay open.
    Items {
        items: Vec<Aircraft>,
        first_delay: Option<Duration>,
        hold_open: bool,
    },
    /// Emit a single error element.
    Fail { code: Code, message: String },
    /// Refuse the call before any stream exists.
    Unavailable,
}

impl Script {
    pub const fn items(items: Vec<Aircraft>) -> Self {
        Self::Items {
            items,
            first_delay: None,
            hold_open: false,
        }
    }

    pub fn fails_with(status: Status) -> Self {
        Self::Fail {
            code: status.code(),
            message: status.message().to_string(),
        }
    }

    /// Delay the first element.
    pub fn first_after(mut self, delay: Duration) -> Self {
        if let Self::Items { first_delay, .. } = &mut self {
            *first_delay = Some(delay);
        }
        self
    }

    /// Never complete after the last element.
    pub fn hold_open(mut self) -> Self {
        if let Self::Items { hold_open, .. } = &mut self {
            *hold_open = true;
        }
        self
    }
}

/// In-memory [`AircraftSource`] playing scripts in call order.
///
/// The last script repeats once the others are used up.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    scripts: Mutex<VecDeque<Script>>,
    calls: AtomicUsize,
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            ..Self::default()
        }
    }

    /// Number of `aircraft_stream` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Streams handed out and not yet dropped.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live streams observed.
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    /// Wait until every handed-out stream has been dropped.
    pub async fn wait_idle(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.live() > 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
    }

    fn next_script(&self) -> Script {
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.len() > 1 {
            scripts.pop_front().unwrap()
        } else {
            scripts.front().cloned().unwrap_or(Script::Unavailable)
        }
    }
}

#[tonic::async_trait]
impl AircraftSource for ScriptedSource {
    async fn aircraft_stream(&self, _at: Timestamp) -> Result<AircraftStream, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let stream = match self.next_script() {
            Script::Unavailable => {
                return Err(UpstreamError::NotReady("scripted outage".into()));
            }
            Script::Fail { code, message } => ScriptedStream {
                delay: None,
                items: VecDeque::new(),
                error: Some(Status::new(code, message)),
                hold_open: false,
                _guard: LiveGuard::new(&self.live, &self.max_live),
            },
            Script::Items {
                items,
                first_delay,
                hold_open,
            } => ScriptedStream {
                delay: first_delay.map(|d| Box::pin(tokio::time::sleep(d))),
                items: items.into(),
                error: None,
                hold_open,
                _guard: LiveGuard::new(&self.live, &self.max_live),
            },
        };
        Ok(Box::pin(stream))
    }
}

/// Counts a stream as live for as long as it exists.
struct LiveGuard {
    live: Arc<AtomicUsize>,
}

impl LiveGuard {
    fn new(live: &Arc<AtomicUsize>, max_live: &AtomicUsize) -> Self {
        let now = live.fetch_add(1, Ordering::SeqCst) + 1;
        max_live.fetch_max(now, Ordering::SeqCst);
        Self {
            live: Arc::clone(live),
        }
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

struct ScriptedStream {
    delay: Option<Pin<Box<Sleep>>>,
    items: VecDeque<Aircraft>,
    error: Option<Status>,
    hold_open: bool,
    _guard: LiveGuard,
}

impl Stream for ScriptedStream {
    type Item = Result<Aircraft, Status>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(delay) = this.delay.as_mut() {
            ready!(delay.as_mut().poll(cx));
            this.delay = None;
        }
        if let Some(item) = this.items.pop_front() {
            return Poll::Ready(Some(Ok(item)));
        }
        if let Some(status) = this.error.take() {
            return Poll::Ready(Some(Err(status)));
        }
        if this.hold_open {
            Poll::Pending
        } else {
            Poll::Ready(None)
        }
    }
}

/// Router over `source` with a recording event sink.
pub fn test_router(source: &Arc<ScriptedSource>) -> (RelayRouter, Arc<RecordingEventSink>) {
    let events = Arc::new(RecordingEventSink::new());
    let router = RelayRouter::new(
        Arc::clone(source) as Arc<dyn AircraftSource>,
        Arc::clone(&events) as Arc<dyn EventSink>,
        16,
    );
    (router, events)
}

/// Aircraft fixture with a distinguishing callsign and altitude.
pub fn aircraft(callsign: &str, altitude: i32) -> Aircraft {
    Aircraft {
        callsign: callsign.into(),
        registration: "N37502".into(),
        flight_number: "UA123".into(),
        aircraft_type: "B738".into(),
        altitude,
        heading: 270,
        speed: 450,
        latitude: 37.618_999,
        longitude: -122.375_000,
    }
}

pub fn test_timestamp() -> Timestamp {
    "2024-01-01T00:00:00Z".parse().unwrap()
}

pub fn weather(observation: &str) -> Weather {
    Weather {
        when: Some(test_timestamp()),
        observation: observation.into(),
    }
}

/// Inbound weather stream for a channel, plus the sender that feeds it.
pub fn inbound_channel() -> (
    mpsc::Sender<Result<Weather, Status>>,
    ReceiverStream<Result<Weather, Status>>,
) {
    let (tx, rx) = mpsc::channel(32);
    (tx, ReceiverStream::new(rx))
}

/// Drain a stream, panicking on error elements or after five seconds.
pub async fn collect<S>(stream: S) -> Vec<Aircraft>
where
    S: Stream<Item = Result<Aircraft, Status>>,
{
    tokio::time::timeout(
        Duration::from_secs(5),
        stream.map(|item| item.unwrap()).collect::<Vec<_>>(),
    )
    .await
    .unwrap()
}
