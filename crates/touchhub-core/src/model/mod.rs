// ── Domain model ──
//
// Canonical types for a hub's catalog and identity. Built from the raw
// wire types in `touchhub-api` by `crate::convert`.

pub mod activity;
pub mod catalog;
pub mod hub;

pub use activity::{Activity, OFF_ACTIVITY_ID};
pub use catalog::{ControlGroup, Device, Function, HubCatalog};
pub use hub::HubInfo;

/// Key used by every case-insensitive index: trimmed and lowercased.
pub(crate) fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}
