//! gRPC server for the AeroRelay relay.
//!
//! Serves `aerorelay.v1.Relay` plus the standard `grpc.health.v1.Health`
//! on a single TCP listener.

pub mod grpc_util;
pub mod relay_svc;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;


pub use relay_svc::RelayService;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::info;

use aerorelay_core::RelayConfig;
use aerorelay_proto::v1::relay_server::RelayServer;

use crate::events::{EventSink, TracingEventSink};
use crate::router::{RelayRouter, Route};
use crate::upstream::{AircraftSource, UpstreamConnector, UpstreamError};

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// gRPC server handle.
pub struct GrpcServer {
    router: RelayRouter,
}

impl GrpcServer {
    /// Wrap an already-built router.
    pub const fn new(router: RelayRouter) -> Self {
        Self { router }
    }

    /// Validate `config`, connect to the upstream and build the router.
    ///
    /// Fails if the upstream is unreachable so the relay never starts
    /// without its feed.
    pub async fn connect(config: &RelayConfig) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let connector = UpstreamConnector::connect(&config.upstream).await?;
        info!(
            upstream = connector.uri(),
            channel_buffer = config.channel_buffer,
            "Relay router ready"
        );
        let router = RelayRouter::new(
            Arc::new(connector) as Arc<dyn AircraftSource>,
            Arc::new(TracingEventSink) as Arc<dyn EventSink>,
            config.channel_buffer,
        );
        Ok(Self::new(router))
    }

    /// Serve on `addr` until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, addr: SocketAddr, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(addr).await?;
        self.serve_with_incoming(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn serve_with_incoming<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = listener.local_addr()?;
        let (health_reporter, health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<RelayServer<RelayService>>()
            .await;

        for route in Route::ALL {
            info!(route = %route, pattern = ?route.pattern(), "Route registered");
        }
        info!(%addr, "Starting relay gRPC server");

        Server::builder()
            .http2_keepalive_interval(Some(Duration::from_secs(30)))
            .http2_keepalive_timeout(Some(Duration::from_secs(10)))
            .add_service(health_service)
            .add_service(RelayServer::new(RelayService::new(self.router)))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
            .await?;

        info!("Relay stopped");
        Ok(())
    }
}
