//! Route subcommands: reqresp, reqstream, fireforget, channel.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::time::Duration;

use prost_types::Timestamp;
use tokio_stream::StreamExt;

use aerorelay_proto::v1::Weather;

use crate::connection::RelayConnection;

/// Route subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum RouteAction {
    /// Request one aircraft.
    Reqresp {
        /// Timestamp to send (RFC 3339); defaults to now.
        #[arg(long)]
        at: Option<Timestamp>,
    },
    /// Stream aircraft.
    Reqstream {
        /// Timestamp to send (RFC 3339); defaults to now.
        #[arg(long)]
        at: Option<Timestamp>,
        /// Stop after this many aircraft.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Send one weather observation; nothing comes back.
    Fireforget {
        /// Observation text.
        #[arg(long)]
        observation: String,
        /// Observation time (RFC 3339); defaults to now.
        #[arg(long)]
        at: Option<Timestamp>,
    },
    /// Send a weather feed and print the aircraft for the latest observation.
    Channel {
        /// Observations to send, in order.
        #[arg(long = "observation", required = true)]
        observations: Vec<String>,
        /// Delay between observations.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Stop after this many aircraft.
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Execute a route subcommand.
pub async fn run(action: RouteAction, conn: &mut RelayConnection) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match action {
        RouteAction::Reqresp { at } => {
            let aircraft = conn.request_response(at.unwrap_or_else(now)).await?;
            writeln!(out, "{aircraft}")?;
        }
        RouteAction::Reqstream { at, limit } => {
            let stream = conn.request_stream(at.unwrap_or_else(now)).await?;
            let mut stream = stream.take(limit.unwrap_or(usize::MAX));
            while let Some(aircraft) = stream.next().await {
                writeln!(out, "{}", aircraft?)?;
            }
        }
        RouteAction::Fireforget { observation, at } => {
            let weather = Weather {
                when: Some(at.unwrap_or_else(now)),
                observation,
            };
            conn.fire_and_forget(weather.clone()).await?;
            writeln!(out, "Sent {weather}")?;
        }
        RouteAction::Channel {
            observations,
            interval_ms,
            limit,
        } => {
            let (weather_tx, mut aircraft_rx, handle) = conn.channel().await?;
            let sender = tokio::spawn(send_observations(
                weather_tx,
                observations,
                Duration::from_millis(interval_ms),
            ));

            let mut received = 0;
            while limit.is_none_or(|n| received < n) {
                let Some(aircraft) = aircraft_rx.recv().await else {
                    break;
                };
                writeln!(out, "{}", aircraft?)?;
                received += 1;
            }

            sender.abort();
            drop(aircraft_rx);
            let _ = handle.await;
        }
    }
    Ok(())
}

/// Send each observation, `interval` apart, then close the inbound side.
async fn send_observations(
    tx: tokio::sync::mpsc::Sender<Weather>,
    observations: Vec<String>,
    interval: Duration,
) {
    for (i, observation) in observations.into_iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(interval).await;
        }
        let weather = Weather {
            when: Some(now()),
            observation,
        };
        if tx.send(weather).await.is_err() {
            return;
        }
    }
}

fn now() -> Timestamp {
    Timestamp::from(std::time::SystemTime::now())
}
