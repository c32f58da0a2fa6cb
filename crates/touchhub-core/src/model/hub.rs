use serde::{Deserialize, Serialize};
use touchhub_api::HubAnnouncement;

/// Identity of a discovered hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubInfo {
    pub ip: String,
    pub host_name: Option<String>,
    pub friendly_name: Option<String>,
}

impl HubInfo {
    pub fn new(
        ip: impl Into<String>,
        host_name: Option<String>,
        friendly_name: Option<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            host_name,
            friendly_name,
        }
    }

    /// Case-insensitive exact match against host name or friendly name.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        [&self.host_name, &self.friendly_name]
            .into_iter()
            .flatten()
            .any(|candidate| candidate.to_lowercase() == name)
    }

    /// Friendly name, falling back to host name, then IP. For logs.
    pub fn display_name(&self) -> &str {
        self.friendly_name
            .as_deref()
            .or(self.host_name.as_deref())
            .unwrap_or(&self.ip)
    }
}

impl From<HubAnnouncement> for HubInfo {
    fn from(hub: HubAnnouncement) -> Self {
        Self {
            ip: hub.ip,
            host_name: hub.host_name,
            friendly_name: hub.friendly_name,
        }
    }
}
