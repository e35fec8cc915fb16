//! Relay router that maps each inbound route onto the upstream aircraft feed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use prost_types::Timestamp;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tonic::Status;
use tracing::{debug, warn};

use aerorelay_proto::v1::{Aircraft, Weather};

use crate::events::{EventSink, RelayEvent};
use crate::router::switch_latest::SwitchLatest;
use crate::router::Route;
use crate::server::grpc_util::is_peer_disconnect;
use crate::upstream::{AircraftSource, AircraftStream, UpstreamError};

/// Routes the four interaction patterns to the upstream feed.
///
/// Every route records its inbound value on the event sink before the
/// upstream call is issued.
#[derive(Clone)]
pub struct RelayRouter {
    source: Arc<dyn AircraftSource>,
    events: Arc<dyn EventSink>,
    channel_buffer: usize,
}

impl RelayRouter {
    pub fn new(
        source: Arc<dyn AircraftSource>,
        events: Arc<dyn EventSink>,
        channel_buffer: usize,
    ) -> Self {
        Self {
            source,
            events,
            channel_buffer: channel_buffer.max(1),
        }
    }

    /// Request/response: the first aircraft of a fresh upstream stream.
    ///
    /// The upstream subscription is dropped (cancelled) as soon as the first
    /// element arrives. An upstream that completes without elements yields
    /// [`RelayError::EmptyResult`].
    pub async fn request_response(
        &self,
        session_id: &str,
        at: Timestamp,
    ) -> Result<Aircraft, RelayError> {
        self.events.record(&RelayEvent::TimestampReceived {
            route: Route::ReqResp,
            session_id,
            at: &at,
        });

        let mut upstream = self.source.aircraft_stream(timestamp_now()).await?;
        match upstream.next().await {
            Some(Ok(aircraft)) => {
                debug!(session_id, callsign = %aircraft.callsign, "First aircraft received");
                Ok(aircraft)
            }
            Some(Err(status)) => Err(RelayError::Upstream(UpstreamError::Call(status))),
            None => Err(RelayError::EmptyResult),
        }
    }

    /// Request/stream: the upstream stream, unmodified.
    ///
    /// Dropping the returned stream cancels the upstream subscription.
    pub async fn request_stream(
        &self,
        session_id: &str,
        at: Timestamp,
    ) -> Result<AircraftStream, RelayError> {
        self.events.record(&RelayEvent::TimestampReceived {
            route: Route::ReqStream,
            session_id,
            at: &at,
        });

        Ok(self.source.aircraft_stream(timestamp_now()).await?)
    }

    /// Fire-and-forget: record the weather and drop it. Never fails.
    pub fn fire_and_forget(&self, session_id: &str, weather: &Weather) {
        self.events.record(&RelayEvent::WeatherReceived {
            route: Route::FireForget,
            session_id,
            weather,
        });
    }

    /// Channel: every inbound weather element switches the session to a fresh
    /// upstream subscription, cancelling the previous one first.
    ///
    /// The returned stream ends when the inbound stream has ended and the
    /// last subscription has completed, or with the first error from either
    /// side. Dropping it cancels the session.
    ///
    /// Items still queued from a superseded subscription are discarded
    /// rather than delivered after the switch.
    pub fn channel<S>(&self, session_id: String, inbound: S) -> AircraftStream
    where
        S: Stream<Item = Result<Weather, Status>> + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::channel(self.channel_buffer);
        let latest = Arc::new(AtomicU64::new(0));
        let router = self.clone();
        let driver_latest = Arc::clone(&latest);
        tokio::spawn(async move {
            router
                .drive_channel(session_id, inbound, tx, driver_latest)
                .await;
        });
        Box::pin(
            ReceiverStream::new(rx).filter_map(move |tagged: Tagged| {
                (tagged.generation >= latest.load(Ordering::SeqCst)).then_some(tagged.item)
            }),
        )
    }

    async fn drive_channel<S>(
        self,
        session_id: String,
        mut inbound: S,
        tx: mpsc::Sender<Tagged>,
        latest: Arc<AtomicU64>,
    ) where
        S: Stream<Item = Result<Weather, Status>> + Send + Unpin + 'static,
    {
        self.events.record(&RelayEvent::WeatherFeedSubscribed {
            session_id: &session_id,
        });

        let session = CancellationToken::new();
        let mut slot = SwitchLatest::new(session.clone());

        loop {
            tokio::select! {
                biased;
                () = session.cancelled() => break,
                () = tx.closed() => {
                    debug!(session_id = %session_id, "Channel caller went away");
                    break;
                }
                next = inbound.next() => match next {
                    Some(Ok(weather)) => {
                        self.events.record(&RelayEvent::WeatherReceived {
                            route: Route::Channel,
                            session_id: &session_id,
                            weather: &weather,
                        });
                        // Bumped before the switch so the output side drops
                        // whatever the old subscription already queued.
                        let generation = latest.fetch_add(1, Ordering::SeqCst) + 1;
                        let subscription = UpstreamSubscription {
                            source: Arc::clone(&self.source),
                            session: session.clone(),
                            tx: tx.clone(),
                            session_id: session_id.clone(),
                            generation,
                        };
                        slot.switch(move |token| subscription.run(token)).await;
                    }
                    Some(Err(status)) => {
                        if is_peer_disconnect(&status) {
                            debug!(session_id = %session_id, error = %status, "Weather feed disconnected");
                        } else {
                            warn!(session_id = %session_id, error = %status, "Weather feed failed");
                            let generation = latest.load(Ordering::SeqCst);
                            let _ = tx.send(Tagged { generation, item: Err(status) }).await;
                        }
                        break;
                    }
                    None => {
                        debug!(session_id = %session_id, "Weather feed completed");
                        slot.join_current().await;
                        break;
                    }
                },
            }
        }

        session.cancel();
        slot.cancel_current().await;
        debug!(session_id = %session_id, subscriptions = slot.switches(), "Channel session closed");
    }
}

/// A channel output item, stamped with the subscription that produced it.
struct Tagged {
    generation: u64,
    item: Result<Aircraft, Status>,
}

/// One upstream subscription started by a channel weather element.
struct UpstreamSubscription {
    source: Arc<dyn AircraftSource>,
    session: CancellationToken,
    tx: mpsc::Sender<Tagged>,
    session_id: String,
    generation: u64,
}

impl UpstreamSubscription {
    async fn run(self, token: CancellationToken) {
        let opened = tokio::select! {
            biased;
            () = token.cancelled() => return,
            opened = self.source.aircraft_stream(timestamp_now()) => opened,
        };
        let mut upstream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                self.fail(RelayError::from(e).into()).await;
                return;
            }
        };
        debug!(session_id = %self.session_id, generation = self.generation, "Upstream subscription started");

        loop {
            let item = tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(session_id = %self.session_id, generation = self.generation, "Upstream subscription cancelled");
                    return;
                }
                () = self.tx.closed() => return,
                item = upstream.next() => item,
            };
            match item {
                Some(Ok(aircraft)) => {
                    let sent = tokio::select! {
                        biased;
                        () = token.cancelled() => return,
                        sent = self.tx.send(self.tag(Ok(aircraft))) => sent,
                    };
                    if sent.is_err() {
                        return;
                    }
                }
                Some(Err(status)) => {
                    self.fail(status).await;
                    return;
                }
                None => {
                    debug!(session_id = %self.session_id, generation = self.generation, "Upstream subscription completed");
                    return;
                }
            }
        }
    }

    fn tag(&self, item: Result<Aircraft, Status>) -> Tagged {
        Tagged {
            generation: self.generation,
            item,
        }
    }

    /// End the session and deliver the upstream failure to the caller.
    ///
    /// The session is cancelled first so the driver stops taking weather.
    async fn fail(&self, status: Status) {
        warn!(session_id = %self.session_id, generation = self.generation, error = %status, "Upstream subscription failed");
        self.session.cancel();
        let _ = self.tx.send(self.tag(Err(status))).await;
    }
}

/// Current wall-clock time as the payload for upstream requests.
pub fn timestamp_now() -> Timestamp {
    Timestamp::from(std::time::SystemTime::now())
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Upstream aircraft stream completed without elements")]
    EmptyResult,
}

impl From<RelayError> for Status {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::EmptyResult => Self::not_found(RelayError::EmptyResult.to_string()),
            RelayError::Upstream(UpstreamError::Call(status)) => status,
            RelayError::Upstream(
                e @ (UpstreamError::ConnectFailed { .. } | UpstreamError::NotReady(_)),
            ) => Self::unavailable(e.to_string()),
            RelayError::Upstream(
                e @ (UpstreamError::InvalidAddress(_) | UpstreamError::InvalidRoute(_)),
            ) => Self::internal(e.to_string()),
        }
    }
}
