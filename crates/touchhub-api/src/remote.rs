// Remote device interface
//
// The BLE four-button remote is driven by an external adapter that
// reports button transitions, battery level and errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::broadcast;

use crate::error::Error;

/// Physical buttons on the remote. `MultiTouch` is several pressed at once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Button {
    North,
    East,
    South,
    West,
    MultiTouch,
}

/// A button transition: a short press or a hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub button: Button,
    #[serde(default)]
    pub hold: bool,
}

impl ButtonEvent {
    pub fn press(button: Button) -> Self {
        Self {
            button,
            hold: false,
        }
    }

    pub fn hold(button: Button) -> Self {
        Self { button, hold: true }
    }
}

/// Everything the remote adapter reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    Button(ButtonEvent),
    /// Battery charge in percent.
    Battery(u8),
    Error(String),
}

#[async_trait]
pub trait RemoteDevice: Send + Sync {
    async fn connect(&self) -> Result<(), Error>;

    /// Must be safe to call more than once.
    async fn disconnect(&self);

    fn subscribe(&self) -> broadcast::Receiver<RemoteEvent>;
}
