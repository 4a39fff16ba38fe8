use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::entities::{AnomalyCandidate, AnomalyRecord, ReconcileOutcome, ResolutionPolicy};
use crate::value_objects::AnomalyType;

/// Folds a candidate into the active record for its location, or builds a
/// fresh active record when there is none.
pub fn merge_candidate(
    existing: Option<&AnomalyRecord>,
    candidate: &AnomalyCandidate,
    radius_km: f64,
    now: DateTime<Utc>,
) -> (AnomalyRecord, ReconcileOutcome) {
    match existing {
        Some(current) => {
            let mut record = current.clone();
            record.score = candidate.score();
            record.event_count = candidate.event_count;
            record.baseline_rate = candidate.baseline_rate();
            record.current_rate = candidate.current_rate();
            record.alert_level = candidate.alert_level;
            record.anomaly_type = candidate.anomaly_type();
            record.description = candidate.describe();
            record.center_lat = candidate.center_lat;
            record.center_lon = candidate.center_lon;
            record.detected_at = now;
            record.revision = current.revision + 1;
            (record, ReconcileOutcome::Updated)
        }
        None => (
            AnomalyRecord {
                id: Uuid::new_v4().to_string(),
                location: candidate.location.clone(),
                center_lat: candidate.center_lat,
                center_lon: candidate.center_lon,
                radius_km,
                score: candidate.score(),
                event_count: candidate.event_count,
                baseline_rate: candidate.baseline_rate(),
                current_rate: candidate.current_rate(),
                alert_level: candidate.alert_level,
                anomaly_type: candidate.anomaly_type(),
                description: candidate.describe(),
                is_active: true,
                first_detected_at: now,
                detected_at: now,
                resolved_at: None,
                revision: 0,
            },
            ReconcileOutcome::Inserted,
        ),
    }
}

/// Inputs the resolution policy needs from the current run.
#[derive(Debug, Clone, Default)]
pub struct RunReaffirmation {
    /// Ids of records inserted or updated by this run.
    pub reaffirmed_ids: HashSet<String>,
    /// Anomaly types whose method completed in this run.
    pub completed_types: HashSet<AnomalyType>,
    /// Locations that qualified this run but whose write failed. Their
    /// records stay as they are.
    pub failed_locations: HashSet<String>,
}

/// Picks the active records the policy resolves at `now`.
pub fn stale_records(
    active: &[AnomalyRecord],
    policy: ResolutionPolicy,
    run: &RunReaffirmation,
    now: DateTime<Utc>,
) -> Vec<AnomalyRecord> {
    active
        .iter()
        .filter(|record| record.is_active)
        .filter(|record| !run.failed_locations.contains(&record.location))
        .filter(|record| match policy {
            ResolutionPolicy::Disabled => false,
            ResolutionPolicy::NotReaffirmed => {
                run.completed_types.contains(&record.anomaly_type)
                    && !run.reaffirmed_ids.contains(&record.id)
            }
            ResolutionPolicy::MaxAge { max_age_hours } => {
                record.detected_at < now - Duration::hours(max_age_hours)
            }
        })
        .cloned()
        .collect()
}

pub fn resolve_record(record: &AnomalyRecord, now: DateTime<Utc>) -> AnomalyRecord {
    let mut resolved = record.clone();
    resolved.is_active = false;
    resolved.resolved_at = Some(now);
    resolved.revision = record.revision + 1;
    resolved
}
