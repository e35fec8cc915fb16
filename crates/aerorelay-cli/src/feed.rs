//! Simulated upstream aircraft feed.
//!
//! Serves `aerorelay.v1.AircraftStream/acstream` with a fixed fleet whose
//! positions advance every tick, so the relay can be demoed without a real
//! ADS-B source.

use std::pin::Pin;
use std::time::Duration;

use prost_types::Timestamp;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use aerorelay_proto::v1::Aircraft;
use aerorelay_proto::v1::aircraft_stream_server::{AircraftStream, AircraftStreamServer};

const NM_PER_DEGREE: f64 = 60.0;

struct Seed {
    callsign: &'static str,
    registration: &'static str,
    flight_number: &'static str,
    aircraft_type: &'static str,
    altitude: i32,
    heading: i32,
    speed: i32,
    latitude: f64,
    longitude: f64,
}

const FLEET: [Seed; 4] = [
    Seed {
        callsign: "UAL123",
        registration: "N37502",
        flight_number: "UA123",
        aircraft_type: "B738",
        altitude: 35_000,
        heading: 270,
        speed: 450,
        latitude: 38.6270,
        longitude: -90.1994,
    },
    Seed {
        callsign: "DAL456",
        registration: "N302DN",
        flight_number: "DL456",
        aircraft_type: "A321",
        altitude: 31_000,
        heading: 90,
        speed: 430,
        latitude: 38.7487,
        longitude: -90.3700,
    },
    Seed {
        callsign: "SWA789",
        registration: "N8710M",
        flight_number: "WN789",
        aircraft_type: "B38M",
        altitude: 12_000,
        heading: 180,
        speed: 300,
        latitude: 39.1000,
        longitude: -90.2500,
    },
    Seed {
        callsign: "AAL321",
        registration: "N103NN",
        flight_number: "AA321",
        aircraft_type: "A319",
        altitude: 24_000,
        heading: 45,
        speed: 380,
        latitude: 38.4000,
        longitude: -90.6000,
    },
];

/// The simulated fleet at some point in time.
#[derive(Debug, Clone)]
pub struct Fleet {
    aircraft: Vec<Aircraft>,
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new()
    }
}

impl Fleet {
    /// The starting fleet.
    pub fn new() -> Self {
        let aircraft = FLEET
            .iter()
            .map(|s| Aircraft {
                callsign: s.callsign.into(),
                registration: s.registration.into(),
                flight_number: s.flight_number.into(),
                aircraft_type: s.aircraft_type.into(),
                altitude: s.altitude,
                heading: s.heading,
                speed: s.speed,
                latitude: s.latitude,
                longitude: s.longitude,
            })
            .collect();
        Self { aircraft }
    }

    pub fn aircraft(&self) -> &[Aircraft] {
        &self.aircraft
    }

    /// Move every aircraft along its heading for `elapsed`.
    pub fn advance(&mut self, elapsed: Duration) {
        let hours = elapsed.as_secs_f64() / 3600.0;
        for ac in &mut self.aircraft {
            let distance_nm = f64::from(ac.speed) * hours;
            let heading = f64::from(ac.heading).to_radians();
            let dlat = distance_nm * heading.cos() / NM_PER_DEGREE;
            let dlon =
                distance_nm * heading.sin() / (NM_PER_DEGREE * ac.latitude.to_radians().cos());
            ac.latitude += dlat;
            ac.longitude += dlon;
        }
    }
}

type FeedStream = Pin<Box<dyn Stream<Item = Result<Aircraft, Status>> + Send>>;

/// `AircraftStream` implementation emitting the fleet once per tick.
#[derive(Debug, Clone)]
pub struct SimulatedFeed {
    interval: Duration,
}

impl SimulatedFeed {
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Emit snapshots of `fleet` into `tx` until the receiver goes away.
    async fn run(self, mut fleet: Fleet, tx: mpsc::Sender<Result<Aircraft, Status>>) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            for ac in fleet.aircraft() {
                if tx.send(Ok(ac.clone())).await.is_err() {
                    debug!("Feed subscriber went away");
                    return;
                }
            }
            fleet.advance(self.interval);
        }
    }
}

#[tonic::async_trait]
#[allow(non_camel_case_types)]
impl AircraftStream for SimulatedFeed {
    type acstreamStream = FeedStream;

    async fn aircraft_stream(
        &self,
        request: Request<Timestamp>,
    ) -> Result<Response<Self::acstreamStream>, Status> {
        info!(at = %request.get_ref(), "Feed subscription");
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(self.clone().run(Fleet::new(), tx));
        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}

/// Serve the simulated feed on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, interval: Duration, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    info!(addr = %listener.local_addr()?, ?interval, "Simulated aircraft feed listening");
    Server::builder()
        .add_service(AircraftStreamServer::new(SimulatedFeed::new(interval)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use tokio_stream::StreamExt;

    use super::*;

    #[test]
    fn fleet_starts_with_fixed_aircraft() {
        let fleet = Fleet::new();
        let callsigns: Vec<_> = fleet.aircraft().iter().map(|a| a.callsign.as_str()).collect();
        assert_eq!(callsigns, ["UAL123", "DAL456", "SWA789", "AAL321"]);
    }

    #[test]
    fn advance_moves_along_heading() {
        let mut fleet = Fleet::new();
        let before = fleet.aircraft().to_vec();
        fleet.advance(Duration::from_secs(60));
        let after = fleet.aircraft();

        // UAL123 heads west: longitude decreases, latitude ~unchanged.
        assert!(after[0].longitude < before[0].longitude);
        assert!((after[0].latitude - before[0].latitude).abs() < 1e-9);
        // DAL456 heads east.
        assert!(after[1].longitude > before[1].longitude);
        // SWA789 heads south.
        assert!(after[2].latitude < before[2].latitude);
        // AAL321 heads north-east.
        assert!(after[3].latitude > before[3].latitude);
        assert!(after[3].longitude > before[3].longitude);
        // Identity fields never change.
        assert_eq!(after[0].callsign, before[0].callsign);
        assert_eq!(after[0].altitude, before[0].altitude);
    }

    #[test]
    fn one_hour_at_sixty_knots_south_is_one_degree() {
        let mut fleet = Fleet {
            aircraft: vec![Aircraft {
                heading: 180,
                speed: 60,
                latitude: 10.0,
                ..Aircraft::default()
            }],
        };
        fleet.advance(Duration::from_secs(3600));
        assert!((fleet.aircraft()[0].latitude - 9.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn feed_emits_fleet_each_tick() {
        let feed = SimulatedFeed::new(Duration::from_secs(1));
        let stream = feed
            .aircraft_stream(Request::new(Timestamp::default()))
            .await
            .unwrap()
            .into_inner();

        let first_two_ticks: Vec<Aircraft> = stream
            .take(FLEET.len() * 2)
            .map(|a| a.unwrap())
            .collect()
            .await;

        let (tick1, tick2) = first_two_ticks.split_at(FLEET.len());
        assert_eq!(tick1[0].callsign, "UAL123");
        assert_eq!(tick2[0].callsign, "UAL123");
        assert!(tick2[0].longitude < tick1[0].longitude);
    }
}
