//! AeroRelay Server
//!
//! gRPC relay that forwards four interaction patterns to one upstream
//! aircraft feed.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use aerorelay_core::RelayConfig;
use aerorelay_core::config::load_config;
use aerorelay_core::tracing_init::init_tracing;
use aerorelay_relay::server::GrpcServer;

#[derive(Parser, Debug)]
#[command(name = "aerorelay")]
#[command(
    version,
    about = "AeroRelay server - routes request/response, streams and channels to an aircraft feed"
)]
struct Args {
    /// Path to a JSON config file layered over the global config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, env = "AERORELAY_LISTEN_ADDR")]
    listen: Option<SocketAddr>,

    /// Upstream aircraft feed host.
    #[arg(long, env = "AERORELAY_UPSTREAM_HOST")]
    upstream_host: Option<String>,

    /// Upstream aircraft feed port.
    #[arg(long, env = "AERORELAY_UPSTREAM_PORT")]
    upstream_port: Option<u16>,

    /// Per-session outbound channel capacity.
    #[arg(long, env = "AERORELAY_CHANNEL_BUFFER")]
    channel_buffer: Option<usize>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// CLI flags are the highest-priority config layer.
    fn apply(&self, config: &mut RelayConfig) {
        if let Some(addr) = self.listen {
            config.listen_addr = addr;
        }
        if let Some(host) = &self.upstream_host {
            config.upstream.host.clone_from(host);
        }
        if let Some(port) = self.upstream_port {
            config.upstream.port = port;
        }
        if let Some(n) = self.channel_buffer {
            config.channel_buffer = n;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("aerorelay_relay=info", args.log_json);

    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.listen_addr,
        upstream = %config.upstream.uri(),
        "Starting aerorelay"
    );

    let server = GrpcServer::connect(&config).await?;
    server
        .serve_with_shutdown(config.listen_addr, async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
            }
        })
        .await?;

    Ok(())
}
