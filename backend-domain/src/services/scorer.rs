use std::collections::BTreeMap;

use crate::entities::{
    AnomalyCandidate, AnomalySignal, EscalationThresholds, FrequencyThresholds, GridCell,
};
use crate::errors::DetectionError;
use crate::services::baseline::Baseline;
use crate::services::location::clean_location;
use crate::value_objects::{AlertLevel, CellId};

/// Poisson-approximation z-score of an observed count against an expected
/// rate. Non-positive rates are replaced by `floor_rate`.
pub fn z_score(recent_count: usize, baseline_rate: f64, floor_rate: f64) -> f64 {
    let rate = if baseline_rate > 0.0 {
        baseline_rate
    } else {
        floor_rate.max(f64::MIN_POSITIVE)
    };
    (recent_count as f64 - rate) / rate.sqrt()
}

#[derive(Debug, Clone)]
pub struct AnomalyScorer {
    frequency: FrequencyThresholds,
    escalation: EscalationThresholds,
    floor_rate: f64,
}

impl AnomalyScorer {
    pub fn new(frequency: FrequencyThresholds, escalation: EscalationThresholds, floor_rate: f64) -> Self {
        Self {
            frequency,
            escalation,
            floor_rate,
        }
    }

    /// Tier for a frequency z-score, `None` when it does not exceed the
    /// qualifying threshold.
    pub fn frequency_level(&self, z: f64) -> Option<AlertLevel> {
        if !(z > self.frequency.z_threshold) {
            return None;
        }
        if z > self.frequency.red_z {
            Some(AlertLevel::Red)
        } else if z > self.frequency.orange_z {
            Some(AlertLevel::Orange)
        } else {
            Some(AlertLevel::Yellow)
        }
    }

    pub fn score_frequency(
        &self,
        recent: &BTreeMap<CellId, GridCell>,
        baseline: &Baseline,
    ) -> Vec<AnomalyCandidate> {
        let mut candidates = Vec::new();
        for (cell_id, cell) in recent {
            if cell.count < self.frequency.min_recent_count {
                continue;
            }
            let baseline_rate = baseline.rate_for(cell_id);
            let z = z_score(cell.count, baseline_rate, self.floor_rate);
            let Some(alert_level) = self.frequency_level(z) else {
                continue;
            };
            candidates.push(build_candidate(
                cell,
                alert_level,
                AnomalySignal::Frequency {
                    z_score: z,
                    baseline_rate,
                    recent_count: count_u32(cell.count),
                },
            ));
        }
        candidates
    }

    pub fn score_escalation(
        &self,
        recent: &BTreeMap<CellId, GridCell>,
    ) -> Result<Vec<AnomalyCandidate>, DetectionError> {
        let total: usize = recent.values().map(|cell| cell.count).sum();
        if total < self.escalation.min_cell_events {
            return Err(DetectionError::InsufficientData {
                observed: total,
                required: self.escalation.min_cell_events,
            });
        }

        let mut candidates = Vec::new();
        for cell in recent.values() {
            if let Some(candidate) = self.escalation_for_cell(cell) {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }

    fn escalation_for_cell(&self, cell: &GridCell) -> Option<AnomalyCandidate> {
        let latest_count = self.escalation.latest_count.max(1);
        if cell.members.len() < self.escalation.min_cell_events || cell.members.len() <= latest_count {
            return None;
        }

        let mut members: Vec<_> = cell.members.iter().collect();
        members.sort_by_key(|event| event.timestamp);
        let magnitudes: Vec<f64> = members.iter().map(|event| event.magnitude).collect();
        let (earlier, latest) = magnitudes.split_at(magnitudes.len() - latest_count);

        let latest_mean = mean(latest);
        let earlier_mean = mean(earlier);
        if !(latest_mean > earlier_mean + self.escalation.min_increase
            && latest_mean >= self.escalation.min_latest_mean)
        {
            return None;
        }

        let alert_level = match self.escalation.red_above_magnitude {
            Some(limit) if latest_mean > limit => AlertLevel::Red,
            _ => self.escalation.alert_level,
        };
        let last_magnitude = latest.last().copied().unwrap_or(latest_mean);
        Some(build_candidate(
            cell,
            alert_level,
            AnomalySignal::MagnitudeEscalation {
                latest_mean,
                earlier_mean,
                last_magnitude,
            },
        ))
    }
}

fn build_candidate(cell: &GridCell, alert_level: AlertLevel, signal: AnomalySignal) -> AnomalyCandidate {
    AnomalyCandidate {
        cell_id: cell.cell_id,
        location: clean_location(&cell.location),
        center_lat: cell.center_lat,
        center_lon: cell.center_lon,
        event_count: count_u32(cell.count),
        max_magnitude: cell.max_magnitude,
        alert_level,
        signal,
    }
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DetectionConfig, SeismicEvent};
    use crate::services::{BaselineEstimator, GridBinner};
    use crate::value_objects::{AnomalyType, EventSource};
    use chrono::{Duration, TimeZone, Utc};

    fn scorer() -> AnomalyScorer {
        let config = DetectionConfig::default();
        AnomalyScorer::new(config.frequency, config.escalation, config.baseline_floor_rate)
    }

    fn events_at(lat: f64, lon: f64, magnitudes: &[f64], location: &str) -> Vec<SeismicEvent> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        magnitudes
            .iter()
            .enumerate()
            .map(|(i, mag)| SeismicEvent {
                event_id: format!("kandilli_{lat}_{lon}_{i}"),
                timestamp: start + Duration::minutes(i as i64 * 30),
                latitude: lat,
                longitude: lon,
                magnitude: *mag,
                depth_km: 8.0,
                location: location.to_string(),
                source: EventSource::Kandilli,
            })
            .collect()
    }

    fn bin(events: &[SeismicEvent]) -> BTreeMap<CellId, GridCell> {
        GridBinner::new(0.45).bin(events)
    }

    #[test]
    fn z_score_increases_with_recent_count() {
        let mut previous = f64::MIN;
        for count in 0..50 {
            let z = z_score(count, 1.7, 0.5);
            assert!(z > previous);
            previous = z;
        }
    }

    #[test]
    fn z_score_decreases_with_baseline_rate() {
        let mut previous = f64::MAX;
        for step in 1..60 {
            let z = z_score(12, step as f64 * 0.25, 0.5);
            assert!(z < previous);
            previous = z;
        }
    }

    #[test]
    fn zero_baseline_uses_floor_instead_of_dividing_by_zero() {
        let z = z_score(10, 0.0, 0.5);
        assert!(z.is_finite());
        assert!((z - (10.0 - 0.5) / 0.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn frequency_tiers_follow_fixed_boundaries() {
        let scorer = scorer();
        assert_eq!(scorer.frequency_level(2.5), None);
        assert_eq!(scorer.frequency_level(2.51), Some(AlertLevel::Yellow));
        assert_eq!(scorer.frequency_level(3.5), Some(AlertLevel::Yellow));
        assert_eq!(scorer.frequency_level(3.51), Some(AlertLevel::Orange));
        assert_eq!(scorer.frequency_level(5.0), Some(AlertLevel::Orange));
        assert_eq!(scorer.frequency_level(5.01), Some(AlertLevel::Red));
        assert_eq!(scorer.frequency_level(f64::NAN), None);
    }

    #[test]
    fn frequency_scenario_from_ninety_day_baseline_is_red() {
        let estimator = BaselineEstimator::from_config(&DetectionConfig::default());
        let history = events_at(38.41, 27.14, &[2.0; 18], "IZMIR");
        let baseline = estimator.estimate(&GridBinner::new(0.45).count(&history)).unwrap();

        let recent = bin(&events_at(38.41, 27.14, &[2.5; 6], "IZMIR"));
        let candidates = scorer().score_frequency(&recent, &baseline);
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.alert_level, AlertLevel::Red);
        assert_eq!(candidate.anomaly_type(), AnomalyType::Frequency);
        assert!((candidate.score() - 8.854).abs() < 1e-3);
        assert_eq!(candidate.baseline_rate(), Some(0.4));
        assert_eq!(candidate.current_rate(), Some(6.0));
    }

    #[test]
    fn frequency_requires_absolute_count_floor() {
        let estimator = BaselineEstimator::from_config(&DetectionConfig::default());
        let history = events_at(10.0, 10.0, &[2.0; 30], "elsewhere");
        let baseline = estimator.estimate(&GridBinner::new(0.45).count(&history)).unwrap();

        // z = (4 - 0.5) / sqrt(0.5) ≈ 4.95 but only four events
        let recent = bin(&events_at(38.41, 27.14, &[2.5; 4], "IZMIR"));
        assert!(scorer().score_frequency(&recent, &baseline).is_empty());

        let recent = bin(&events_at(38.41, 27.14, &[2.5; 5], "IZMIR"));
        let candidates = scorer().score_frequency(&recent, &baseline);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].baseline_rate(), Some(0.5));
    }

    #[test]
    fn escalation_scenario_is_orange() {
        let recent = bin(&events_at(38.41, 27.14, &[2.0, 2.1, 2.0, 3.8, 3.9, 4.0], "SOMA (MANISA) Ilksel"));
        let candidates = scorer().score_escalation(&recent).unwrap();
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.alert_level, AlertLevel::Orange);
        assert_eq!(candidate.location, "SOMA (MANISA)");
        match candidate.signal {
            AnomalySignal::MagnitudeEscalation {
                latest_mean,
                earlier_mean,
                last_magnitude,
            } => {
                assert!((latest_mean - 3.9).abs() < 1e-9);
                assert!((earlier_mean - 2.0333).abs() < 1e-3);
                assert!((last_magnitude - 4.0).abs() < 1e-9);
            }
            _ => panic!("expected escalation signal"),
        }
        assert_eq!(candidate.baseline_rate(), None);
    }

    #[test]
    fn escalation_needs_five_events_in_cell() {
        let scorer = scorer();
        let mut events = events_at(38.41, 27.14, &[2.0, 3.9, 4.0, 4.1], "A");
        // padding elsewhere so the window as a whole has enough data
        events.extend(events_at(-20.0, 60.0, &[1.0; 5], "B"));
        let candidates = scorer.score_escalation(&bin(&events)).unwrap();
        assert!(candidates.is_empty());

        let events = events_at(38.41, 27.14, &[2.0, 2.0, 3.9, 4.0, 4.1], "A");
        let candidates = scorer.score_escalation(&bin(&events)).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn escalation_orders_members_by_time() {
        let mut events = events_at(38.41, 27.14, &[2.0, 2.1, 2.0, 3.8, 3.9, 4.0], "A");
        events.reverse();
        let candidates = scorer().score_escalation(&bin(&events)).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn escalation_requires_minimum_latest_mean() {
        let events = events_at(38.41, 27.14, &[1.0, 1.1, 1.0, 2.6, 2.7, 2.8], "A");
        assert!(scorer().score_escalation(&bin(&events)).unwrap().is_empty());
    }

    #[test]
    fn escalation_with_too_few_recent_events_is_insufficient() {
        let events = events_at(38.41, 27.14, &[3.0, 4.0], "A");
        let err = scorer().score_escalation(&bin(&events)).unwrap_err();
        assert_eq!(
            err,
            DetectionError::InsufficientData {
                observed: 2,
                required: 5
            }
        );
    }

    #[test]
    fn escalation_red_threshold_is_configurable() {
        let config = DetectionConfig::default();
        let mut escalation = config.escalation.clone();
        escalation.red_above_magnitude = Some(3.5);
        let scorer = AnomalyScorer::new(config.frequency, escalation, config.baseline_floor_rate);
        let events = events_at(38.41, 27.14, &[2.0, 2.1, 2.0, 3.8, 3.9, 4.0], "A");
        let candidates = scorer.score_escalation(&bin(&events)).unwrap();
        assert_eq!(candidates[0].alert_level, AlertLevel::Red);
    }
}
