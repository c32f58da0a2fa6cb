use std::fmt;

use serde::{Deserialize, Serialize};

/// Id of the synthetic "everything off" activity.
pub const OFF_ACTIVITY_ID: &str = "-1";

/// A named macro state on a hub, e.g. "TV kijken".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub label: String,
}

impl Activity {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// The off sentinel. Never part of a catalog.
    pub fn off() -> Self {
        Self {
            id: OFF_ACTIVITY_ID.to_owned(),
            label: String::new(),
        }
    }

    pub fn is_off(&self) -> bool {
        self.id == OFF_ACTIVITY_ID
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_off() {
            f.write_str("off")
        } else {
            write!(f, "{} ({})", self.label, self.id)
        }
    }
}
