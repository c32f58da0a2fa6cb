// ── Core error types ──
//
// User-facing errors from touchhub-core. These are NOT transport-specific:
// consumers never see websocket failures or JSON parse errors directly.
// The `From<touchhub_api::Error>` impl translates collaborator errors
// into domain-appropriate variants.
//
// Every field is an owned string so the error is `Clone`: a coalesced
// activity refresh hands the same result to every waiting caller.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("No hub found that can be identified with '{query}'")]
    HubNotFound { query: String },

    #[error("No activity found with name '{name}'")]
    ActivityNotFound { name: String },

    #[error("No device found that could be identified with '{hint}'")]
    DeviceNotFound { hint: String },

    #[error("No group of controls found that could be identified using '{hint}' on device '{device}'")]
    ControlGroupNotFound { hint: String, device: String },

    #[error(
        "No function found that could be identified in the group of controls '{group}' using '{hint}' on device '{device}'"
    )]
    FunctionNotFound {
        hint: String,
        group: String,
        device: String,
    },

    // ── Session errors ───────────────────────────────────────────────
    #[error("Could not get a list of commands from hub {ip}: {reason}")]
    CatalogUnavailable { ip: String, reason: String },

    #[error("Hub {ip} is not ready for commands")]
    NotReady { ip: String },

    #[error("Hub connection closed")]
    TransportClosed,

    #[error("Cannot connect to hub at {ip}: {reason}")]
    ConnectionFailed { ip: String, reason: String },

    #[error("Hub request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Collaborator errors (wrapped, not exposed raw) ───────────────
    #[error("Hub API error: {message}")]
    Api { message: String },

    #[error("Hub discovery failed: {message}")]
    Discovery { message: String },

    #[error("Remote device error: {message}")]
    Remote { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Hub registry has been stopped")]
    RegistryStopped,

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for every lookup failure (hub, activity, device,
    /// control group, function).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::HubNotFound { .. }
                | Self::ActivityNotFound { .. }
                | Self::DeviceNotFound { .. }
                | Self::ControlGroupNotFound { .. }
                | Self::FunctionNotFound { .. }
        )
    }
}

// ── Conversion from collaborator errors ──────────────────────────────

impl From<touchhub_api::Error> for CoreError {
    fn from(err: touchhub_api::Error) -> Self {
        match err {
            touchhub_api::Error::Connect { ip, reason } => Self::ConnectionFailed { ip, reason },
            touchhub_api::Error::Request(message) => Self::Api { message },
            touchhub_api::Error::Closed => Self::TransportClosed,
            touchhub_api::Error::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            touchhub_api::Error::Deserialization { message, body: _ } => {
                Self::Internal(format!("Deserialization error: {message}"))
            }
            touchhub_api::Error::Discovery(message) => Self::Discovery { message },
            touchhub_api::Error::Remote(message) => Self::Remote { message },
        }
    }
}
