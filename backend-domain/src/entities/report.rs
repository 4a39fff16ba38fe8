// Report and alert delivery entities

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize)]
pub struct ReportSummary {
    pub total_events: usize,
    pub max_magnitude: f64,
    pub red: u64,
    pub orange: u64,
    pub yellow: u64,
    pub active_anomalies: usize,
}

impl ReportSummary {
    pub fn total_anomalies(&self) -> u64 {
        self.red + self.orange + self.yellow
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AlertDeliveryRecord {
    pub timestamp_ms: i64,
    pub status: String,
    pub mode: String,
    pub alert_count: usize,
    pub locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
