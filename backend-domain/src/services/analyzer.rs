use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::entities::{AnomalyCandidate, DetectionConfig, MethodStatus, SeismicEvent, TimeRange};
use crate::errors::DetectionError;
use crate::services::{AnomalyScorer, BaselineEstimator, GridBinner};
use crate::value_objects::AnomalyType;

/// Result of scoring one snapshot of events.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub candidates: Vec<AnomalyCandidate>,
    pub frequency: MethodStatus,
    pub escalation: MethodStatus,
}

impl AnalysisOutcome {
    /// Outcome for a run whose event read failed.
    pub fn failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            candidates: Vec::new(),
            frequency: MethodStatus::Failed {
                reason: reason.clone(),
            },
            escalation: MethodStatus::Failed { reason },
        }
    }

    pub fn completed_types(&self) -> HashSet<AnomalyType> {
        let mut types = HashSet::new();
        if self.frequency.is_completed() {
            types.insert(AnomalyType::Frequency);
        }
        if self.escalation.is_completed() {
            types.insert(AnomalyType::MagnitudeEscalation);
        }
        types
    }
}

/// Binning, baseline and scoring wired from one `DetectionConfig`.
#[derive(Debug, Clone)]
pub struct SeismicAnalyzer {
    config: DetectionConfig,
    binner: GridBinner,
    estimator: BaselineEstimator,
    scorer: AnomalyScorer,
}

impl SeismicAnalyzer {
    pub fn new(config: DetectionConfig) -> Self {
        let binner = GridBinner::new(config.cell_size_deg);
        let estimator = BaselineEstimator::from_config(&config);
        let scorer = AnomalyScorer::new(
            config.frequency.clone(),
            config.escalation.clone(),
            config.baseline_floor_rate,
        );
        Self {
            config,
            binner,
            estimator,
            scorer,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn detection_range(&self, now: DateTime<Utc>) -> TimeRange {
        TimeRange::last_hours(now, self.config.detection_window_hours)
    }

    pub fn baseline_range(&self, now: DateTime<Utc>) -> TimeRange {
        self.estimator.lookback_range(now)
    }

    /// Scores `recent` against `history`. Frequency candidates come first,
    /// then escalation candidates, each ordered by cell.
    pub fn analyze(&self, recent: &[SeismicEvent], history: &[SeismicEvent]) -> AnalysisOutcome {
        let cells = self.binner.bin(recent);
        let mut candidates = Vec::new();

        let frequency = match self.estimator.estimate(&self.binner.count(history)) {
            Ok(baseline) => {
                let found = self.scorer.score_frequency(&cells, &baseline);
                let status = MethodStatus::Completed {
                    candidates: found.len(),
                };
                candidates.extend(found);
                status
            }
            Err(err) => insufficient(err),
        };

        let escalation = match self.scorer.score_escalation(&cells) {
            Ok(found) => {
                let status = MethodStatus::Completed {
                    candidates: found.len(),
                };
                candidates.extend(found);
                status
            }
            Err(err) => insufficient(err),
        };

        AnalysisOutcome {
            candidates,
            frequency,
            escalation,
        }
    }
}

fn insufficient(err: DetectionError) -> MethodStatus {
    match err {
        DetectionError::InsufficientData { observed, required } => {
            MethodStatus::InsufficientData { observed, required }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{AlertLevel, EventSource};
    use chrono::{Duration, TimeZone};

    fn event(id: usize, lat: f64, lon: f64, magnitude: f64, at: DateTime<Utc>) -> SeismicEvent {
        SeismicEvent {
            event_id: format!("usgs_{id}"),
            timestamp: at,
            latitude: lat,
            longitude: lon,
            magnitude,
            depth_km: 10.0,
            location: "AKHISAR (MANISA) Ilksel".to_string(),
            source: EventSource::Usgs,
        }
    }

    #[test]
    fn empty_snapshot_reports_insufficient_data_for_both_methods() {
        let analyzer = SeismicAnalyzer::new(DetectionConfig::default());
        let outcome = analyzer.analyze(&[], &[]);
        assert!(outcome.candidates.is_empty());
        assert_eq!(
            outcome.frequency,
            MethodStatus::InsufficientData {
                observed: 0,
                required: 10
            }
        );
        assert_eq!(
            outcome.escalation,
            MethodStatus::InsufficientData {
                observed: 0,
                required: 5
            }
        );
        assert!(outcome.completed_types().is_empty());
    }

    #[test]
    fn missing_baseline_still_runs_escalation() {
        let analyzer = SeismicAnalyzer::new(DetectionConfig::default());
        let now = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        let recent: Vec<_> = [2.0, 2.1, 2.0, 3.8, 3.9, 4.0]
            .iter()
            .enumerate()
            .map(|(i, mag)| event(i, 38.9, 27.8, *mag, now - Duration::hours(6 - i as i64)))
            .collect();

        let outcome = analyzer.analyze(&recent, &[]);
        assert!(matches!(outcome.frequency, MethodStatus::InsufficientData { .. }));
        assert_eq!(outcome.escalation, MethodStatus::Completed { candidates: 1 });
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].alert_level, AlertLevel::Orange);
        assert_eq!(outcome.candidates[0].location, "AKHISAR (MANISA)");
        assert_eq!(
            outcome.completed_types(),
            HashSet::from([AnomalyType::MagnitudeEscalation])
        );
    }

    #[test]
    fn frequency_candidates_precede_escalation() {
        let analyzer = SeismicAnalyzer::new(DetectionConfig::default());
        let now = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        let history: Vec<_> = (0..18)
            .map(|i| event(100 + i, 38.9, 27.8, 2.0, now - Duration::days(10 + i as i64)))
            .collect();
        let recent: Vec<_> = [2.0, 2.1, 2.0, 3.8, 3.9, 4.0]
            .iter()
            .enumerate()
            .map(|(i, mag)| event(i, 38.9, 27.8, *mag, now - Duration::hours(6 - i as i64)))
            .collect();

        let outcome = analyzer.analyze(&recent, &history);
        let types: Vec<_> = outcome.candidates.iter().map(|c| c.anomaly_type()).collect();
        assert_eq!(types, vec![AnomalyType::Frequency, AnomalyType::MagnitudeEscalation]);
        assert_eq!(outcome.candidates[0].alert_level, AlertLevel::Red);
    }

    #[test]
    fn failed_outcome_marks_both_methods() {
        let outcome = AnalysisOutcome::failed("store offline");
        assert!(outcome.candidates.is_empty());
        assert!(matches!(outcome.frequency, MethodStatus::Failed { .. }));
        assert!(matches!(outcome.escalation, MethodStatus::Failed { .. }));
    }
}
