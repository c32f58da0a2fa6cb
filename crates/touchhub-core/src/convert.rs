// ── Wire-to-domain conversion ──
//
// Maps the raw catalog types from touchhub-api into the canonical model.
// Hubs list their own power-off activity (id "-1") in the catalog; it is
// dropped here because "off" is always the synthesized sentinel.

use touchhub_api::{RawActivity, RawCatalog, RawControlGroup, RawDevice, RawFunction};

use crate::model::{Activity, ControlGroup, Device, Function, HubCatalog, OFF_ACTIVITY_ID};

impl From<RawActivity> for Activity {
    fn from(raw: RawActivity) -> Self {
        Self {
            id: raw.id,
            label: raw.label,
        }
    }
}

impl From<RawFunction> for Function {
    fn from(raw: RawFunction) -> Self {
        Self {
            name: raw.name,
            action: raw.action,
            label: raw.label,
        }
    }
}

impl From<RawControlGroup> for ControlGroup {
    fn from(raw: RawControlGroup) -> Self {
        Self {
            name: raw.name,
            functions: raw.function.into_iter().map(Function::from).collect(),
        }
    }
}

impl From<RawDevice> for Device {
    fn from(raw: RawDevice) -> Self {
        Self {
            id: raw.id,
            label: raw.label,
            device_type_display_name: raw.device_type_display_name,
            control_groups: raw
                .control_group
                .into_iter()
                .map(ControlGroup::from)
                .collect(),
        }
    }
}

/// Build the indexed catalog from a raw config payload.
pub fn catalog_from_raw(raw: RawCatalog) -> HubCatalog {
    let activities = raw
        .activity
        .into_iter()
        .filter(|a| a.id != OFF_ACTIVITY_ID)
        .map(Activity::from)
        .collect();
    let devices = raw.device.into_iter().map(Device::from).collect();
    HubCatalog::new(activities, devices)
}
