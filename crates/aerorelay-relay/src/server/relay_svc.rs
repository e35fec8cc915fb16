//! `aerorelay.v1.Relay` service: the four client-facing routes.

use tonic::{Request, Response, Status, Streaming};
use tracing::{Span, info, instrument};

use prost_types::Timestamp;
use aerorelay_proto::v1::relay_server::Relay;
use aerorelay_proto::v1::{Ack, Aircraft, Weather};

use crate::router::RelayRouter;
use crate::server::grpc_util::new_session_id;
use crate::upstream::AircraftStream;

/// Serves the relay routes by delegating to a shared [`RelayRouter`].
#[derive(Clone)]
pub struct RelayService {
    router: RelayRouter,
}

impl RelayService {
    pub const fn new(router: RelayRouter) -> Self {
        Self { router }
    }
}

/// Allocate a session id and attach it to the current span.
fn begin_session() -> String {
    let session_id = new_session_id();
    Span::current().record("session_id", session_id.as_str());
    session_id
}

#[tonic::async_trait]
#[allow(non_camel_case_types)]
impl Relay for RelayService {
    type reqstreamStream = AircraftStream;
    type channelStream = AircraftStream;

    #[instrument(skip(self, request), fields(rpc = "reqresp", session_id = tracing::field::Empty))]
    async fn request_response(
        &self,
        request: Request<Timestamp>,
    ) -> Result<Response<Aircraft>, Status> {
        let session_id = begin_session();
        let aircraft = self
            .router
            .request_response(&session_id, request.into_inner())
            .await?;
        Ok(Response::new(aircraft))
    }

    #[instrument(skip(self, request), fields(rpc = "reqstream", session_id = tracing::field::Empty))]
    async fn request_stream(
        &self,
        request: Request<Timestamp>,
    ) -> Result<Response<Self::reqstreamStream>, Status> {
        let session_id = begin_session();
        let stream = self
            .router
            .request_stream(&session_id, request.into_inner())
            .await?;
        Ok(Response::new(stream))
    }

    #[instrument(skip(self, request), fields(rpc = "fireforget", session_id = tracing::field::Empty))]
    async fn fire_and_forget(&self, request: Request<Weather>) -> Result<Response<Ack>, Status> {
        let session_id = begin_session();
        self.router
            .fire_and_forget(&session_id, &request.into_inner());
        Ok(Response::new(Ack {}))
    }

    #[instrument(skip(self, request), fields(rpc = "channel", session_id = tracing::field::Empty))]
    async fn channel(
        &self,
        request: Request<Streaming<Weather>>,
    ) -> Result<Response<Self::channelStream>, Status> {
        let session_id = begin_session();
        info!("Channel session opened");
        let stream = self.router.channel(session_id, request.into_inner());
        Ok(Response::new(stream))
    }
}
