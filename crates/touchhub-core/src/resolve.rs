// ── Catalog resolver ──
//
// Pure lookups over a `HubCatalog`: no I/O, no state. Users type short
// names ("tv", "volumeUp") instead of full labels, so device and action
// lookups fall back to fuzzy prefix/suffix matching with fixed tie-breaks:
// catalog order for devices, last match for control groups, first match
// for functions.

use crate::error::CoreError;
use crate::model::{Activity, Device, Function, HubCatalog, normalize};

/// Name that always resolves to the off sentinel.
const OFF_NAME: &str = "off";

/// Resolve an activity by label, case-insensitively.
///
/// `"off"` in any case yields [`Activity::off`], even if the catalog has
/// a real activity with that label.
pub fn resolve_activity(catalog: &HubCatalog, name_or_off: &str) -> Result<Activity, CoreError> {
    let key = normalize(name_or_off);
    if key == OFF_NAME {
        return Ok(Activity::off());
    }
    catalog
        .activity_by_key(&key)
        .cloned()
        .ok_or_else(|| CoreError::ActivityNotFound {
            name: name_or_off.to_owned(),
        })
}

/// Resolve an activity id reported by the hub. Unknown ids mean off.
pub fn activity_by_id(catalog: &HubCatalog, id: &str) -> Activity {
    catalog
        .activities()
        .find(|a| a.id == id)
        .cloned()
        .unwrap_or_else(Activity::off)
}

/// Resolve a device: exact label first, then the first device whose label
/// or device type ends with the hint.
///
/// The suffix match uses the hint lowercased but untrimmed, so an empty
/// hint selects the first device in the catalog.
pub fn resolve_device<'a>(catalog: &'a HubCatalog, hint: &str) -> Result<&'a Device, CoreError> {
    if let Some(device) = catalog.device_by_key(&normalize(hint)) {
        return Ok(device);
    }

    let suffix = hint.to_lowercase();
    catalog
        .devices()
        .find(|device| {
            normalize(&device.label).ends_with(&suffix)
                || device
                    .device_type_display_name
                    .as_deref()
                    .is_some_and(|kind| normalize(kind).ends_with(&suffix))
        })
        .ok_or_else(|| CoreError::DeviceNotFound {
            hint: hint.to_owned(),
        })
}

/// Resolve a function on a device from a hint such as `"volumeUp"`.
///
/// The control group is the *last* one whose name prefixes the hint; the
/// function is the *first* in that group whose name suffixes it.
pub fn resolve_action<'a>(device: &'a Device, hint: &str) -> Result<&'a Function, CoreError> {
    let hint_lc = hint.to_lowercase();

    let group = device
        .control_groups
        .iter()
        .rev()
        .find(|group| hint_lc.starts_with(&normalize(&group.name)))
        .ok_or_else(|| CoreError::ControlGroupNotFound {
            hint: hint.to_owned(),
            device: device.label.clone(),
        })?;

    group
        .functions
        .iter()
        .find(|function| hint_lc.ends_with(&normalize(&function.name)))
        .ok_or_else(|| CoreError::FunctionNotFound {
            hint: hint.to_owned(),
            group: group.name.clone(),
            device: device.label.clone(),
        })
}

/// Escape an action for the hub's command encoding: every `:` becomes `::`.
pub fn encode_action(function: &Function) -> String {
    function.action.replace(':', "::")
}
