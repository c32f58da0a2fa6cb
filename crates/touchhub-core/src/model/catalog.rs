// ── Hub catalog ──
//
// Immutable snapshot of a hub's activities and devices, fetched once per
// connection. Both collections keep catalog order and are indexed by
// normalized (trimmed, lowercased) label for case-insensitive lookup.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Activity, normalize};

/// A single command on a device. `action` is forwarded to the hub after
/// colon escaping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub action: String,
    pub label: Option<String>,
}

/// A category of functions on a device, e.g. "Volume".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlGroup {
    pub name: String,
    pub functions: Vec<Function>,
}

/// A remote-controllable device known to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub label: String,
    pub device_type_display_name: Option<String>,
    pub control_groups: Vec<ControlGroup>,
}

/// Activities and devices of one hub.
///
/// Two entries whose labels normalize to the same key collapse into one:
/// the later entry wins but keeps the earlier entry's position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubCatalog {
    activities: IndexMap<String, Activity>,
    devices: IndexMap<String, Device>,
}

impl HubCatalog {
    pub fn new(activities: Vec<Activity>, devices: Vec<Device>) -> Self {
        Self {
            activities: activities
                .into_iter()
                .map(|a| (normalize(&a.label), a))
                .collect(),
            devices: devices
                .into_iter()
                .map(|d| (normalize(&d.label), d))
                .collect(),
        }
    }

    /// Activities in catalog order.
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.values()
    }

    /// Devices in catalog order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Look up an activity by an already-normalized label.
    pub(crate) fn activity_by_key(&self, key: &str) -> Option<&Activity> {
        self.activities.get(key)
    }

    /// Look up a device by an already-normalized label.
    pub(crate) fn device_by_key(&self, key: &str) -> Option<&Device> {
        self.devices.get(key)
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
