// Event source value object

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    Kandilli,
    #[serde(rename = "USGS")]
    Usgs,
    #[serde(rename = "AFAD")]
    Afad,
    Unknown,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Kandilli => "Kandilli",
            EventSource::Usgs => "USGS",
            EventSource::Afad => "AFAD",
            EventSource::Unknown => "Unknown",
        }
    }

    /// Prefix used for the natural key of events from this source.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            EventSource::Kandilli => "kandilli",
            EventSource::Usgs => "usgs",
            EventSource::Afad => "afad",
            EventSource::Unknown => "unknown",
        }
    }
}

impl From<&str> for EventSource {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "kandilli" | "koeri" => EventSource::Kandilli,
            "usgs" => EventSource::Usgs,
            "afad" => EventSource::Afad,
            _ => EventSource::Unknown,
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
