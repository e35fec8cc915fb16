//! AeroRelay v1 wire types and generated services.

use std::fmt;

/// A weather observation pushed by a relay client.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Weather {
    /// When the observation was taken.
    #[prost(message, optional, tag = "1")]
    pub when: ::core::option::Option<::prost_types::Timestamp>,
    /// Free-form observation text.
    #[prost(string, tag = "2")]
    pub observation: ::prost::alloc::string::String,
}

/// Empty acknowledgment for fire-and-forget.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct Ack {}

/// A single aircraft position report from the upstream feed.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Aircraft {
    #[prost(string, tag = "1")]
    pub callsign: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub registration: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub flight_number: ::prost::alloc::string::String,
    /// ICAO type designator, e.g. `B738`.
    #[prost(string, tag = "4")]
    pub aircraft_type: ::prost::alloc::string::String,
    /// Feet.
    #[prost(int32, tag = "5")]
    pub altitude: i32,
    /// Degrees true.
    #[prost(int32, tag = "6")]
    pub heading: i32,
    /// Knots.
    #[prost(int32, tag = "7")]
    pub speed: i32,
    #[prost(double, tag = "8")]
    pub latitude: f64,
    #[prost(double, tag = "9")]
    pub longitude: f64,
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.when {
            Some(when) => write!(f, "Weather(when={when}, observation={})", self.observation),
            None => write!(f, "Weather(when=-, observation={})", self.observation),
        }
    }
}

impl fmt::Display for Aircraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Aircraft(callsign={}, reg={}, flightno={}, type={}, altitude={}, heading={}, speed={}, lat={:.5}, lon={:.5})",
            self.callsign,
            self.registration,
            self.flight_number,
            self.aircraft_type,
            self.altitude,
            self.heading,
            self.speed,
            self.latitude,
            self.longitude,
        )
    }
}

include!(concat!(env!("OUT_DIR"), "/aerorelay.v1.Relay.rs"));
include!(concat!(env!("OUT_DIR"), "/aerorelay.v1.AircraftStream.rs"));

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use prost::Message;

    fn ual123() -> Aircraft {
        Aircraft {
            callsign: "UAL123".into(),
            registration: "N12345".into(),
            flight_number: "UA123".into(),
            aircraft_type: "B738".into(),
            altitude: 35_000,
            heading: 270,
            speed: 450,
            latitude: 38.7,
            longitude: -90.3,
        }
    }

    #[test]
    fn aircraft_survives_the_wire() {
        let ac = ual123();
        let decoded = Aircraft::decode(ac.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, ac);
    }

    #[test]
    fn weather_without_timestamp_decodes_as_none() {
        let wx = Weather {
            when: None,
            observation: "CAVOK".into(),
        };
        let decoded = Weather::decode(wx.encode_to_vec().as_slice()).unwrap();
        assert!(decoded.when.is_none());
        assert_eq!(decoded.observation, "CAVOK");
    }

    #[test]
    fn aircraft_display_names_every_field() {
        let text = ual123().to_string();
        assert!(text.starts_with("Aircraft(callsign=UAL123"));
        assert!(text.contains("altitude=35000"));
        assert!(text.contains("type=B738"));
    }

    #[test]
    fn weather_display_uses_rfc3339() {
        let wx = Weather {
            when: Some("2024-01-01T00:00:00Z".parse().unwrap()),
            observation: "light rain".into(),
        };
        assert_eq!(
            wx.to_string(),
            "Weather(when=2024-01-01T00:00:00Z, observation=light rain)"
        );
    }
}
