//! Configuration resolution for `AeroRelay`.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config_dir>/aerorelay/relay.json`)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Complete relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address the relay's gRPC server listens on.
    pub listen_addr: SocketAddr,
    /// The single upstream aircraft feed.
    pub upstream: UpstreamConfig,
    /// Capacity of the per-session outbound channels.
    pub channel_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 7000)),
            upstream: UpstreamConfig::default(),
            channel_buffer: 128,
        }
    }
}

/// Upstream endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub host: String,
    pub port: u16,
    /// Only bounds the initial connect; routes have no timeout.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7635,
            connect_timeout_secs: 5,
        }
    }
}

impl UpstreamConfig {
    /// The `http://host:port` URI tonic connects to.
    pub fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl RelayConfig {
    /// Reject configurations the relay cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.upstream.host.trim().is_empty() {
            return Err(Error::Config("upstream host must not be empty".into()));
        }
        if self.upstream.port == 0 {
            return Err(Error::Config("upstream port must be non-zero".into()));
        }
        if self.channel_buffer == 0 {
            return Err(Error::Config("channel_buffer must be at least 1".into()));
        }
        Ok(())
    }
}

/// On-disk config layer. Every field is optional so a file only overrides
/// what it names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    listen_addr: Option<SocketAddr>,
    #[serde(default)]
    upstream: UpstreamFile,
    channel_buffer: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpstreamFile {
    host: Option<String>,
    port: Option<u16>,
    connect_timeout_secs: Option<u64>,
}

/// Load configuration with hierarchical resolution.
///
/// `explicit` must exist when given; the global file is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<RelayConfig> {
    let mut config = RelayConfig::default();

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            debug!(path = %global_path.display(), "Loading global config");
            merge_config(&mut config, load_config_file(&global_path)?);
        }
    }

    if let Some(path) = explicit {
        debug!(path = %path.display(), "Loading config file");
        merge_config(&mut config, load_config_file(path)?);
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("aerorelay").join("relay.json"))
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn merge_config(base: &mut RelayConfig, overlay: ConfigFile) {
    if let Some(addr) = overlay.listen_addr {
        base.listen_addr = addr;
    }
    if let Some(n) = overlay.channel_buffer {
        base.channel_buffer = n;
    }
    if let Some(host) = overlay.upstream.host {
        base.upstream.host = host;
    }
    if let Some(port) = overlay.upstream.port {
        base.upstream.port = port;
    }
    if let Some(secs) = overlay.upstream.connect_timeout_secs {
        base.upstream.connect_timeout_secs = secs;
    }
}

/// Apply `AERORELAY_*` overrides read through `lookup`.
///
/// Unparseable values are an error rather than silently ignored.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("AERORELAY_LISTEN_ADDR") {
        config.listen_addr = parse_env("AERORELAY_LISTEN_ADDR", &val)?;
    }
    if let Some(val) = lookup("AERORELAY_UPSTREAM_HOST") {
        config.upstream.host = val;
    }
    if let Some(val) = lookup("AERORELAY_UPSTREAM_PORT") {
        config.upstream.port = parse_env("AERORELAY_UPSTREAM_PORT", &val)?;
    }
    if let Some(val) = lookup("AERORELAY_CHANNEL_BUFFER") {
        config.channel_buffer = parse_env("AERORELAY_CHANNEL_BUFFER", &val)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, val: &str) -> Result<T> {
    val.parse()
        .map_err(|_| Error::Config(format!("Invalid value for {key}: {val:?}")))
}
