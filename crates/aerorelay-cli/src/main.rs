//! AeroRelay CLI
//!
//! Exercises each relay route from the command line and can run a
//! simulated upstream aircraft feed.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use aerorelay_cli::connection::{ConnectionConfig, RelayConnection};
use aerorelay_cli::feed;
use aerorelay_cli::route_cmd::{self, RouteAction};
use aerorelay_core::tracing_init::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "aerorelay-cli")]
#[command(version, about = "AeroRelay command-line client", long_about = None)]
struct Cli {
    /// Relay address
    #[arg(long, env = "AERORELAY_ADDR", default_value = "http://127.0.0.1:7000")]
    relay: String,

    /// Output logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Route(RouteAction),

    /// Run a simulated upstream aircraft feed.
    Feed {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:7635")]
        listen: SocketAddr,
        /// Time between fleet snapshots.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing("aerorelay_cli=warn", cli.log_json);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting aerorelay CLI");

    match cli.command {
        Command::Feed {
            listen,
            interval_ms,
        } => {
            let listener = tokio::net::TcpListener::bind(listen).await?;
            feed::serve(listener, Duration::from_millis(interval_ms), async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
        }
        Command::Route(action) => {
            let mut conn = RelayConnection::new(ConnectionConfig {
                addr: cli.relay,
                ..Default::default()
            });
            conn.connect().await?;
            route_cmd::run(action, &mut conn).await
        }
    }
}
