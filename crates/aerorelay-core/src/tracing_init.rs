//! Tracing setup shared by the `aerorelay` server and `aerorelay-cli`.
//!
//! Both binaries log to stderr. For the CLI, stdout carries the relayed
//! aircraft and weather lines, which must stay pipeable; the relay's
//! `Relay event` records go through the same subscriber, so a JSON
//! collector sees events and diagnostics in one stream.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter: `rust_log` when set and non-empty, else `default_filter`.
fn build_filter(default_filter: &str, rust_log: Option<String>) -> EnvFilter {
    let directives = rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default_filter.to_string());
    EnvFilter::new(directives)
}

/// Install the global subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset, e.g.
/// `"aerorelay_relay=info"`. `log_json` switches to one JSON object per line.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let filter = build_filter(default_filter, std::env::var("RUST_LOG").ok());
    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(fmt).init();
    }
}
