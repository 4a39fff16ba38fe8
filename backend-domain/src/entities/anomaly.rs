// Anomaly entities
// Candidates produced by a detection run and the persisted records they merge into

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AlertLevel, AnomalyType, CellId};

/// Method-specific measurements of a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "anomaly_type", rename_all = "snake_case")]
pub enum AnomalySignal {
    Frequency {
        z_score: f64,
        baseline_rate: f64,
        recent_count: u32,
    },
    MagnitudeEscalation {
        latest_mean: f64,
        earlier_mean: f64,
        last_magnitude: f64,
    },
}

/// One qualifying grid cell from one detection method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyCandidate {
    pub cell_id: CellId,
    pub location: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub event_count: u32,
    pub max_magnitude: f64,
    pub alert_level: AlertLevel,
    pub signal: AnomalySignal,
}

impl AnomalyCandidate {
    pub fn anomaly_type(&self) -> AnomalyType {
        match self.signal {
            AnomalySignal::Frequency { .. } => AnomalyType::Frequency,
            AnomalySignal::MagnitudeEscalation { .. } => AnomalyType::MagnitudeEscalation,
        }
    }

    /// Z-score for frequency anomalies, mean of the latest magnitudes for
    /// escalation anomalies.
    pub fn score(&self) -> f64 {
        match self.signal {
            AnomalySignal::Frequency { z_score, .. } => z_score,
            AnomalySignal::MagnitudeEscalation { latest_mean, .. } => latest_mean,
        }
    }

    pub fn baseline_rate(&self) -> Option<f64> {
        match self.signal {
            AnomalySignal::Frequency { baseline_rate, .. } => Some(baseline_rate),
            AnomalySignal::MagnitudeEscalation { .. } => None,
        }
    }

    pub fn current_rate(&self) -> Option<f64> {
        match self.signal {
            AnomalySignal::Frequency { recent_count, .. } => Some(f64::from(recent_count)),
            AnomalySignal::MagnitudeEscalation { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self.signal {
            AnomalySignal::Frequency {
                z_score,
                baseline_rate,
                recent_count,
            } => format!(
                "{} events in window (expected ~{:.1}), z-score {:.2}",
                recent_count, baseline_rate, z_score
            ),
            AnomalySignal::MagnitudeEscalation {
                latest_mean,
                earlier_mean,
                last_magnitude,
            } => format!(
                "latest magnitudes average {:.1} vs {:.1} before (last M{:.1}) over {} events",
                latest_mean, earlier_mean, last_magnitude, self.event_count
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub id: String,
    pub location: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
    pub score: f64,
    pub event_count: u32,
    pub baseline_rate: Option<f64>,
    pub current_rate: Option<f64>,
    pub alert_level: AlertLevel,
    pub anomaly_type: AnomalyType,
    pub description: String,
    pub is_active: bool,
    pub first_detected_at: DateTime<Utc>,
    pub detected_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Incremented on every in-place update.
    pub revision: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnomalyList {
    pub count: usize,
    pub anomalies: Vec<AnomalyRecord>,
}
