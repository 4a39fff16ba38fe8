// Event entity
// A normalized earthquake record from any of the collectors

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::EventSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicEvent {
    /// Source-specific natural key, e.g. `usgs_us7000abcd`.
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: f64,
    pub depth_km: f64,
    pub location: String,
    pub source: EventSource,
}

impl SeismicEvent {
    pub fn is_valid(&self) -> bool {
        !self.event_id.trim().is_empty()
            && self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.magnitude.is_finite()
            && self.depth_km.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && self.magnitude >= 0.0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestEnvelope {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub events: Vec<SeismicEvent>,
}

/// Closed time interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn last_hours(now: DateTime<Utc>, hours: i64) -> Self {
        Self::new(now - Duration::hours(hours), now)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct EventQuery {
    pub hours: Option<i64>,
    pub min_magnitude: Option<f64>,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegionQuery {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: Option<f64>,
    pub hours: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventList {
    pub count: usize,
    pub earthquakes: Vec<SeismicEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionStats {
    pub count: usize,
    pub max_magnitude: f64,
    pub avg_magnitude: f64,
    pub earthquakes: Vec<SeismicEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventStats {
    pub total_24h: usize,
    pub max_magnitude_24h: f64,
    pub active_anomalies: usize,
    /// Timestamp of the newest stored event in the window.
    pub last_update: Option<DateTime<Utc>>,
}
