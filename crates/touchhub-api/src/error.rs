use thiserror::Error;

/// Top-level error type for the `touchhub-api` crate.
///
/// Covers every failure mode a collaborator can report: hub transport,
/// discovery, and the BLE remote. `touchhub-core` maps these into
/// domain-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Hub transport ───────────────────────────────────────────────
    /// The websocket to the hub could not be opened.
    #[error("Cannot connect to hub at {ip}: {reason}")]
    Connect { ip: String, reason: String },

    /// The hub rejected or failed a request.
    #[error("Hub request failed: {0}")]
    Request(String),

    /// The connection was closed (by either side) while a request was pending.
    #[error("Hub connection closed")]
    Closed,

    /// The collaborator gave up waiting for the hub.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Discovery ───────────────────────────────────────────────────
    #[error("Hub discovery failed: {0}")]
    Discovery(String),

    // ── Remote ──────────────────────────────────────────────────────
    #[error("Remote device error: {0}")]
    Remote(String),
}
