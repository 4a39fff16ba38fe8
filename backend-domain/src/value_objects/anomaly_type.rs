// Anomaly type value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    Frequency,
    MagnitudeEscalation,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::Frequency => "frequency",
            AnomalyType::MagnitudeEscalation => "magnitude_escalation",
        }
    }
}

impl From<&str> for AnomalyType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "magnitude_escalation" => AnomalyType::MagnitudeEscalation,
            _ => AnomalyType::Frequency,
        }
    }
}
