use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::entities::{DetectionConfig, TimeRange};
use crate::errors::DetectionError;
use crate::value_objects::CellId;

/// Expected per-window event counts derived from a trailing history.
#[derive(Debug, Clone)]
pub struct BaselineEstimator {
    lookback_days: i64,
    gap_hours: i64,
    window_hours: i64,
    min_events: usize,
    floor_rate: f64,
}

impl BaselineEstimator {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            lookback_days: config.baseline_days,
            gap_hours: config.baseline_gap_hours,
            window_hours: config.detection_window_hours,
            min_events: config.min_baseline_events,
            floor_rate: config.baseline_floor_rate,
        }
    }

    /// History that stops just short of `now - gap_hours`. The detection
    /// window is closed at that instant, so an event there counts as recent
    /// only.
    pub fn lookback_range(&self, now: DateTime<Utc>) -> TimeRange {
        let boundary = now - Duration::hours(self.gap_hours);
        TimeRange::new(
            boundary - Duration::days(self.lookback_days),
            boundary - Duration::milliseconds(1),
        )
    }

    /// Historical count scaled to the detection window length.
    pub fn rate_for_count(&self, historical_count: usize) -> f64 {
        if self.lookback_days <= 0 {
            return 0.0;
        }
        (historical_count as f64 / self.lookback_days as f64) * (self.window_hours as f64 / 24.0)
    }

    pub fn estimate(&self, historical_counts: &BTreeMap<CellId, usize>) -> Result<Baseline, DetectionError> {
        let total: usize = historical_counts.values().sum();
        if total < self.min_events {
            return Err(DetectionError::InsufficientData {
                observed: total,
                required: self.min_events,
            });
        }
        let rates = historical_counts
            .iter()
            .map(|(cell_id, count)| (*cell_id, self.rate_for_count(*count)))
            .collect();
        Ok(Baseline {
            rates,
            floor_rate: self.floor_rate,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Baseline {
    rates: BTreeMap<CellId, f64>,
    floor_rate: f64,
}

impl Baseline {
    /// Expected count for `cell_id`; cells without history (or with a zero
    /// rate) get the floor rate.
    pub fn rate_for(&self, cell_id: &CellId) -> f64 {
        match self.rates.get(cell_id) {
            Some(rate) if *rate > 0.0 => *rate,
            _ => self.floor_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn estimator() -> BaselineEstimator {
        BaselineEstimator::from_config(&DetectionConfig::default())
    }

    fn cell(lat_index: i64, lon_index: i64) -> CellId {
        CellId { lat_index, lon_index }
    }

    #[test]
    fn lookback_excludes_detection_window() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let range = estimator().lookback_range(now);
        let boundary = now - Duration::hours(48);
        assert_eq!(range.start, boundary - Duration::days(90));
        assert!(range.contains(boundary - Duration::milliseconds(1)));
        assert!(!range.contains(boundary));

        let detection = TimeRange::last_hours(now, 48);
        assert!(detection.contains(boundary));
    }

    #[test]
    fn rate_scales_to_window_length() {
        let rate = estimator().rate_for_count(18);
        assert!((rate - 0.4).abs() < 1e-12);
    }

    #[test]
    fn too_little_history_is_insufficient() {
        let mut counts = BTreeMap::new();
        counts.insert(cell(1, 1), 4);
        counts.insert(cell(2, 2), 5);
        let err = estimator().estimate(&counts).unwrap_err();
        assert_eq!(
            err,
            DetectionError::InsufficientData {
                observed: 9,
                required: 10
            }
        );
    }

    #[test]
    fn unknown_cells_fall_back_to_floor() {
        let mut counts = BTreeMap::new();
        counts.insert(cell(1, 1), 18);
        let baseline = estimator().estimate(&counts).unwrap();
        assert!((baseline.rate_for(&cell(1, 1)) - 0.4).abs() < 1e-12);
        assert!((baseline.rate_for(&cell(9, 9)) - 0.5).abs() < 1e-12);
    }
}
