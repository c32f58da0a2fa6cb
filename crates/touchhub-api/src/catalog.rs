// Hub configuration (catalog) wire types
//
// Models for the payload a hub returns from its "get config" request.
// Only the fields touchhub needs are modelled explicitly; the hub sends
// many more, which land in `extra`. Arrays are `#[serde(default)]`
// because hubs with no devices or activities omit them entirely.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// Top-level catalog payload: `{ "activity": [...], "device": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCatalog {
    #[serde(default)]
    pub activity: Vec<RawActivity>,
    #[serde(default)]
    pub device: Vec<RawDevice>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawCatalog {
    /// Parse a catalog out of a raw config payload.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, Error> {
        serde_json::from_value(payload.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: payload.to_string(),
        })
    }
}

/// One activity entry. Hubs send ids as strings, some firmware as numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawActivity {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub label: String,
}

/// One controllable device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDevice {
    #[serde(default, deserialize_with = "optional_id_string")]
    pub id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub device_type_display_name: Option<String>,
    #[serde(default)]
    pub control_group: Vec<RawControlGroup>,
}

/// A named group of functions on a device (e.g. "Volume").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawControlGroup {
    pub name: String,
    #[serde(default)]
    pub function: Vec<RawFunction>,
}

/// A single command. `action` is an opaque payload forwarded to the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFunction {
    pub name: String,
    pub action: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    WireId::deserialize(deserializer).map(String::from)
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<WireId>::deserialize(deserializer).map(|id| id.map(String::from))
}
