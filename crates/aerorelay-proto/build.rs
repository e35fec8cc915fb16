//! Build script for aerorelay-proto
//!
//! Generates the `Relay` and `AircraftStream` service stubs with
//! `tonic-build`'s manual builder. Message types are hand-written prost
//! structs in `src/v1.rs`, so no `protoc` is needed at build time.
//!
//! The manual builder names server-streaming associated types after the
//! route name (`reqstreamStream`, `channelStream`, `acstreamStream`).

use tonic_build::manual::{Builder, Method, Service};

const PACKAGE: &str = "aerorelay.v1";
const CODEC: &str = "tonic_prost::ProstCodec";

fn method(name: &str, route: &str, input: &str, output: &str) -> tonic_build::manual::MethodBuilder {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(input)
        .output_type(output)
        .codec_path(CODEC)
}

fn main() {
    let relay = Service::builder()
        .name("Relay")
        .package(PACKAGE)
        .comment("Client-facing relay exposing the four interaction patterns.")
        .method(
            method("request_response", "reqresp", "::prost_types::Timestamp", "crate::v1::Aircraft")
                .comment("Request/response: first aircraft of a fresh upstream stream.")
                .build(),
        )
        .method(
            method("request_stream", "reqstream", "::prost_types::Timestamp", "crate::v1::Aircraft")
                .comment("Request/stream: the upstream aircraft stream, unmodified.")
                .server_streaming()
                .build(),
        )
        .method(
            method("fire_and_forget", "fireforget", "crate::v1::Weather", "crate::v1::Ack")
                .comment("Fire-and-forget: weather is logged and acknowledged with an empty Ack.")
                .build(),
        )
        .method(
            method("channel", "channel", "crate::v1::Weather", "crate::v1::Aircraft")
                .comment("Channel: each weather element switches to a fresh upstream stream.")
                .client_streaming()
                .server_streaming()
                .build(),
        )
        .build();

    let aircraft_stream = Service::builder()
        .name("AircraftStream")
        .package(PACKAGE)
        .comment("Upstream aircraft position feed.")
        .method(
            method("aircraft_stream", "acstream", "::prost_types::Timestamp", "crate::v1::Aircraft")
                .server_streaming()
                .build(),
        )
        .build();

    Builder::new()
        .build_server(true)
        .build_client(true)
        .compile(&[relay, aircraft_stream]);

    println!("cargo:rerun-if-changed=build.rs");
}
