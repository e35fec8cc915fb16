//! Relay connection client.
//!
//! Manages the gRPC connection to the aerorelay server.

use std::time::Duration;

use prost_types::Timestamp;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Streaming;
use tonic::transport::{Channel, Endpoint};
use tracing::{error, info, warn};

use aerorelay_proto::v1::relay_client::RelayClient;
use aerorelay_proto::v1::{Aircraft, Weather};

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Relay address, e.g. `http://127.0.0.1:7000`.
    pub addr: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            addr: "http://127.0.0.1:7000".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Client connection to the relay.
pub struct RelayConnection {
    config: ConnectionConfig,
    client: Option<RelayClient<Channel>>,
    state: ConnectionState,
}

impl RelayConnection {
    /// Create a new connection (not yet connected).
    pub const fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            client: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connect to the relay.
    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        let endpoint = Endpoint::from_shared(self.config.addr.clone())
            .map_err(|e| ConnectionError::InvalidAddress(e.to_string()))?
            .connect_timeout(self.config.connect_timeout)
            .http2_keep_alive_interval(Duration::from_secs(30))
            .keep_alive_timeout(Duration::from_secs(10));

        let channel = endpoint.connect().await.map_err(|e| {
            self.state = ConnectionState::Disconnected;
            ConnectionError::ConnectFailed(e.to_string())
        })?;

        self.client = Some(RelayClient::new(channel));
        self.state = ConnectionState::Connected;

        info!(addr = %self.config.addr, "Connected");
        Ok(())
    }

    fn client(&mut self) -> Result<&mut RelayClient<Channel>, ConnectionError> {
        self.client.as_mut().ok_or(ConnectionError::NotConnected)
    }

    /// `reqresp`: one aircraft for one timestamp.
    pub async fn request_response(&mut self, at: Timestamp) -> Result<Aircraft, ConnectionError> {
        let response = self.client()?.request_response(at).await?;
        Ok(response.into_inner())
    }

    /// `reqstream`: the relayed aircraft stream.
    pub async fn request_stream(
        &mut self,
        at: Timestamp,
    ) -> Result<Streaming<Aircraft>, ConnectionError> {
        let response = self.client()?.request_stream(at).await?;
        Ok(response.into_inner())
    }

    /// `fireforget`: send one weather observation.
    pub async fn fire_and_forget(&mut self, weather: Weather) -> Result<(), ConnectionError> {
        self.client()?.fire_and_forget(weather).await?;
        Ok(())
    }

    /// Open a `channel` session.
    ///
    /// Returns the weather sender, the aircraft receiver and the handle of
    /// the task pumping the response stream. Dropping the sender ends the
    /// inbound side.
    pub async fn channel(
        &mut self,
    ) -> Result<
        (
            mpsc::Sender<Weather>,
            mpsc::Receiver<Result<Aircraft, tonic::Status>>,
            tokio::task::JoinHandle<()>,
        ),
        ConnectionError,
    > {
        let (weather_tx, weather_rx) = mpsc::channel::<Weather>(32);
        let response = self
            .client()?
            .channel(ReceiverStream::new(weather_rx))
            .await?;
        let mut aircraft_stream = response.into_inner();

        let (aircraft_tx, aircraft_rx) = mpsc::channel(128);
        let handle = tokio::spawn(async move {
            loop {
                match aircraft_stream.message().await {
                    Ok(Some(aircraft)) => {
                        if aircraft_tx.send(Ok(aircraft)).await.is_err() {
                            warn!("Aircraft receiver dropped");
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("Aircraft stream ended");
                        break;
                    }
                    Err(e) => {
                        error!(?e, "Aircraft stream error");
                        let _ = aircraft_tx.send(Err(e)).await;
                        break;
                    }
                }
            }
        });

        Ok((weather_tx, aircraft_rx, handle))
    }
}

/// Connection errors.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Not connected to relay")]
    NotConnected,

    #[error("RPC call failed: {0}")]
    RpcFailed(#[from] tonic::Status),
}
