//! Shared gRPC utility helpers.

use tonic::Code;

/// Check if a gRPC Status represents a normal peer disconnect
/// (client exit, upstream shutdown, transport reset).
///
/// The status code is the primary signal: `Unavailable` and `Cancelled`
/// are what tonic surfaces when the transport drops. Otherwise fall back
/// to substring matching on the message text.
///
/// NOTE: The substring checks are fragile; the wording is an
/// implementation detail of hyper / h2 and may change across versions.
pub fn is_peer_disconnect(status: &tonic::Status) -> bool {
    match status.code() {
        Code::Unavailable | Code::Cancelled => return true,
        _ => {}
    }

    let msg = status.message();
    msg.contains("h2 protocol error")
        || msg.contains("broken pipe")
        || msg.contains("connection reset")
}

/// Fresh identifier for one inbound call, used to correlate log lines.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
