// Hub transport interface
//
// The websocket protocol client lives outside this workspace. touchhub
// drives it through `HubTransport`, and creates one transport per hub
// session through a `HubConnector`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::discovery::HubAnnouncement;
use crate::error::Error;

/// Status code a hub reports for a successful config request.
pub const CODE_OK: u16 = 200;

/// Response to a "get config" request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub status_code: u16,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ConfigResponse {
    pub fn new(status_code: u16, payload: serde_json::Value) -> Self {
        Self {
            status_code,
            payload,
        }
    }

    /// `true` if the hub answered with [`CODE_OK`].
    pub fn is_ok(&self) -> bool {
        self.status_code == CODE_OK
    }

    /// `true` if the payload carries any data at all.
    pub fn has_payload(&self) -> bool {
        match &self.payload {
            serde_json::Value::Null => false,
            serde_json::Value::Object(map) => !map.is_empty(),
            serde_json::Value::Array(items) => !items.is_empty(),
            serde_json::Value::String(s) => !s.is_empty(),
            serde_json::Value::Bool(_) | serde_json::Value::Number(_) => true,
        }
    }
}

/// A connection to a single hub.
///
/// Implementations own their own timeouts; a request that never resolves
/// blocks the session that issued it.
#[async_trait]
pub trait HubTransport: Send + Sync {
    /// Open the connection to the hub at `ip`.
    async fn connect(&self, ip: &str) -> Result<(), Error>;

    /// Fetch the hub's activity and device catalog.
    async fn get_config(&self) -> Result<ConfigResponse, Error>;

    /// Id of the activity the hub is currently running (`"-1"` for off).
    async fn get_current_activity(&self) -> Result<String, Error>;

    /// Ask the hub to start the activity with the given id.
    async fn start_activity(&self, activity_id: &str) -> Result<(), Error>;

    /// Forward an already-encoded device action.
    async fn send_command(&self, encoded_action: &str) -> Result<(), Error>;

    /// Close the connection. Must be safe to call more than once.
    async fn close(&self);

    /// Resolves once the connection is gone, whichever side closed it.
    async fn closed(&self);
}

/// Creates a fresh, unconnected transport for a discovered hub.
pub trait HubConnector: Send + Sync {
    fn open(&self, hub: &HubAnnouncement) -> Arc<dyn HubTransport>;
}
