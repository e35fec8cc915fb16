//! Upstream connector: one long-lived gRPC channel to the aircraft feed.
//!
//! Requests are addressed by route name, mirroring how the feed exposes its
//! procedures: `connector.route("acstream").data(ts).retrieve_stream()`.

use std::pin::Pin;
use std::time::Duration;

use prost::Message;
use prost_types::Timestamp;
use tokio_stream::Stream;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status, Streaming};
use tracing::{debug, info};

use aerorelay_core::UpstreamConfig;
use aerorelay_proto::methods::{AIRCRAFT_STREAM_SERVICE, ROUTE_ACSTREAM, route_path};
use aerorelay_proto::v1::Aircraft;

/// A boxed stream of aircraft as delivered by the upstream.
pub type AircraftStream = Pin<Box<dyn Stream<Item = Result<Aircraft, Status>> + Send>>;

/// Source of upstream aircraft streams.
///
/// Implemented by [`UpstreamConnector`]; tests substitute in-memory sources.
#[tonic::async_trait]
pub trait AircraftSource: Send + Sync + 'static {
    /// Open one `acstream` subscription. Dropping the returned stream cancels it.
    async fn aircraft_stream(&self, at: Timestamp) -> Result<AircraftStream, UpstreamError>;
}

/// Handle to the upstream feed. Cheap to clone; all clones share one HTTP/2
/// connection.
#[derive(Debug, Clone)]
pub struct UpstreamConnector {
    channel: Channel,
    uri: String,
}

impl UpstreamConnector {
    /// Connect to the upstream, failing if it is not reachable right now.
    pub async fn connect(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let uri = config.uri();
        let endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|e| UpstreamError::InvalidAddress(e.to_string()))?
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .http2_keep_alive_interval(Duration::from_secs(30))
            .keep_alive_timeout(Duration::from_secs(10));

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| UpstreamError::ConnectFailed {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;

        info!(%uri, "Connected to upstream aircraft feed");
        Ok(Self { channel, uri })
    }

    /// Address this connector was established against.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Address a named procedure on the upstream feed service.
    pub fn route(&self, name: &str) -> RouteSpec<'_> {
        RouteSpec {
            connector: self,
            route: name.to_string(),
        }
    }
}

/// A route on the upstream, not yet given a payload.
pub struct RouteSpec<'a> {
    connector: &'a UpstreamConnector,
    route: String,
}

impl RouteSpec<'_> {
    /// Attach the request payload.
    pub fn data<P>(self, payload: P) -> RouteRequest<P> {
        RouteRequest {
            channel: self.connector.channel.clone(),
            path: route_path(AIRCRAFT_STREAM_SERVICE, &self.route),
            payload,
        }
    }
}

/// A fully-specified upstream request.
pub struct RouteRequest<P> {
    channel: Channel,
    path: String,
    payload: P,
}

impl<P> RouteRequest<P>
where
    P: Message + Send + Sync + 'static,
{
    /// Issue the request as a server-streaming call and decode each element as `T`.
    pub async fn retrieve_stream<T>(self) -> Result<Streaming<T>, UpstreamError>
    where
        T: Message + Default + Send + Sync + 'static,
    {
        let path = PathAndQuery::try_from(self.path)
            .map_err(|e| UpstreamError::InvalidRoute(e.to_string()))?;

        let mut grpc = tonic::client::Grpc::new(self.channel);
        grpc.ready()
            .await
            .map_err(|e| UpstreamError::NotReady(e.to_string()))?;

        debug!(path = %path, "Opening upstream stream");
        let codec = tonic_prost::ProstCodec::default();
        let response = grpc
            .server_streaming(Request::new(self.payload), path, codec)
            .await?;
        Ok(response.into_inner())
    }
}

#[tonic::async_trait]
impl AircraftSource for UpstreamConnector {
    async fn aircraft_stream(&self, at: Timestamp) -> Result<AircraftStream, UpstreamError> {
        let stream = self
            .route(ROUTE_ACSTREAM)
            .data(at)
            .retrieve_stream::<Aircraft>()
            .await?;
        Ok(Box::pin(stream))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Invalid upstream address: {0}")]
    InvalidAddress(String),

    #[error("Failed to connect to upstream {uri}: {reason}")]
    ConnectFailed { uri: String, reason: String },

    #[error("Upstream not ready: {0}")]
    NotReady(String),

    #[error("Invalid upstream route: {0}")]
    InvalidRoute(String),

    #[error("Upstream call failed: {0}")]
    Call(#[from] Status),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config_for(host: &str, port: u16) -> UpstreamConfig {
        UpstreamConfig {
            host: host.into(),
            port,
            connect_timeout_secs: 1,
        }
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails_fast() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = UpstreamConnector::connect(&config_for("127.0.0.1", port))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::ConnectFailed { .. }));
        assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    }

    #[tokio::test]
    async fn invalid_host_is_rejected_before_connecting() {
        let err = UpstreamConnector::connect(&config_for("not a host", 7635))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidAddress(_)));
    }
}
