// ── Runtime configuration ──
//
// The binding between a four-button remote and one hub. Pure runtime
// types; loading from disk lives in touchhub-config.

use serde::{Deserialize, Serialize};
use touchhub_api::Button;

/// A device/action hint pair, resolved against the catalog at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHint {
    pub device: String,
    pub action: String,
}

impl CommandHint {
    pub fn new(device: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            action: action.into(),
        }
    }
}

/// Which hub the remote drives, which activities its hold gestures start,
/// and which command each short press sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBinding {
    /// Host name, friendly name or IP of the hub.
    pub hub: String,
    /// Started by holding north.
    pub primary_activity: String,
    /// Started by holding east.
    pub secondary_activity: String,
    pub north: CommandHint,
    pub east: CommandHint,
    pub south: CommandHint,
    pub west: CommandHint,
}

impl Default for RemoteBinding {
    fn default() -> Self {
        Self {
            hub: "Huiskamer".into(),
            primary_activity: "TV kijken".into(),
            secondary_activity: "Radio".into(),
            north: CommandHint::new("pvr", "channelUp"),
            east: CommandHint::new("receiver", "volumeUp"),
            south: CommandHint::new("pvr", "channelDown"),
            west: CommandHint::new("receiver", "volumeDown"),
        }
    }
}

impl RemoteBinding {
    /// Command sent by a short press. Multi-touch has none.
    pub fn command_for(&self, button: Button) -> Option<&CommandHint> {
        match button {
            Button::North => Some(&self.north),
            Button::East => Some(&self.east),
            Button::South => Some(&self.south),
            Button::West => Some(&self.west),
            Button::MultiTouch => None,
        }
    }

    /// `true` if `label` is exactly one of the two bound activity labels.
    pub fn is_bound_activity(&self, label: &str) -> bool {
        label == self.primary_activity || label == self.secondary_activity
    }
}
