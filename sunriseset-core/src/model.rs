use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Latitude of the observed location (San Francisco).
pub const LATITUDE: f64 = 37.7749;
/// Longitude of the observed location (San Francisco).
pub const LONGITUDE: f64 = -122.4194;

/// The astronomical events shown on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Sunrise,
    Sunset,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Sunrise => "sunrise",
            EventKind::Sunset => "sunset",
        }
    }

    pub const fn all() -> &'static [EventKind] {
        &[EventKind::Sunrise, EventKind::Sunset]
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EventKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "sunrise" => Ok(EventKind::Sunrise),
            "sunset" => Ok(EventKind::Sunset),
            _ => Err(anyhow::anyhow!(
                "Unknown event kind '{value}'. Supported events: sunrise, sunset."
            )),
        }
    }
}

/// A fetched event instant. Lives only as long as one screen update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTime {
    pub kind: EventKind,
    pub at: DateTime<Utc>,
}
