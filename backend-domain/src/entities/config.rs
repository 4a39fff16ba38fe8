// Configuration entities shared across layers

use serde::{Deserialize, Serialize};

use crate::value_objects::AlertLevel;

/// Thresholds and window lengths for one detection run. Every component of
/// the pipeline receives the values it needs from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Grid cell edge in degrees (0.45° is roughly 50 km).
    pub cell_size_deg: f64,
    /// Radius stored on anomaly records.
    pub cell_radius_km: f64,
    pub detection_window_hours: i64,
    pub baseline_days: i64,
    /// Hours between the end of the baseline and now.
    pub baseline_gap_hours: i64,
    pub min_baseline_events: usize,
    /// Rate substituted for cells whose baseline is zero.
    pub baseline_floor_rate: f64,
    pub frequency: FrequencyThresholds,
    pub escalation: EscalationThresholds,
    pub resolution: ResolutionPolicy,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            cell_size_deg: 0.45,
            cell_radius_km: 50.0,
            detection_window_hours: 48,
            baseline_days: 90,
            baseline_gap_hours: 48,
            min_baseline_events: 10,
            baseline_floor_rate: 0.5,
            frequency: FrequencyThresholds::default(),
            escalation: EscalationThresholds::default(),
            resolution: ResolutionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyThresholds {
    /// Minimum z-score (exclusive) for a cell to qualify.
    pub z_threshold: f64,
    pub min_recent_count: usize,
    /// z above this is at least orange.
    pub orange_z: f64,
    /// z above this is red.
    pub red_z: f64,
}

impl Default for FrequencyThresholds {
    fn default() -> Self {
        Self {
            z_threshold: 2.5,
            min_recent_count: 5,
            orange_z: 3.5,
            red_z: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationThresholds {
    pub min_cell_events: usize,
    /// Number of most recent events averaged against the rest.
    pub latest_count: usize,
    pub min_increase: f64,
    pub min_latest_mean: f64,
    pub alert_level: AlertLevel,
    /// When set, a latest mean above this magnitude escalates to red.
    pub red_above_magnitude: Option<f64>,
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        Self {
            min_cell_events: 5,
            latest_count: 3,
            min_increase: 0.5,
            min_latest_mean: 3.0,
            alert_level: AlertLevel::Orange,
            red_above_magnitude: None,
        }
    }
}

/// How active anomalies that stop recurring are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Records stay active until resolved externally.
    Disabled,
    /// Records not reaffirmed by a completed method in this run are resolved.
    NotReaffirmed,
    /// Records whose last detection is older than the limit are resolved.
    MaxAge { max_age_hours: i64 },
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        ResolutionPolicy::MaxAge { max_age_hours: 48 }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub report_dir: String,
    pub public_base_url: String,
    pub report_webhook_url: Option<String>,
    pub report_webhook_template: Option<String>,
    pub alert_webhook_url: Option<String>,
    pub alert_webhook_template: Option<String>,
    pub alert_min_level: AlertLevel,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub report_hour: u32,
    pub report_minute: u32,
    pub collect_interval_minutes: u64,
    pub detect_interval_minutes: u64,
    pub detection: DetectionConfig,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
}
