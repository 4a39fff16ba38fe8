use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{AppError, AppState};
use backend_domain::services::{merge_candidate, resolve_record, stale_records, RunReaffirmation};
use backend_domain::{
    AnomalyCandidate, AnomalyRecord, AnomalyType, ReconciledAnomaly, ResolutionPolicy,
};

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub applied: Vec<ReconciledAnomaly>,
    pub failed: usize,
    /// Locations whose write failed; resolution leaves them untouched.
    pub failed_locations: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct ResolveReport {
    pub resolved: Vec<AnomalyRecord>,
    pub failed: usize,
}

/// Applies candidates in order, one independent write each. A failed write
/// is logged and counted; later candidates are still applied.
pub async fn reconcile_candidates(
    state: &AppState,
    candidates: &[AnomalyCandidate],
    now: DateTime<Utc>,
) -> ReconcileReport {
    let radius_km = state.analyzer.config().cell_radius_km;
    let mut report = ReconcileReport::default();

    for candidate in candidates {
        match reconcile_one(state, candidate, radius_km, now).await {
            Ok(applied) => report.applied.push(applied),
            Err(err) => {
                warn!(
                    location = %candidate.location,
                    anomaly_type = %candidate.anomaly_type().as_str(),
                    error = %err,
                    "failed to reconcile anomaly"
                );
                report.failed += 1;
                report.failed_locations.insert(candidate.location.clone());
            }
        }
    }
    report
}

async fn reconcile_one(
    state: &AppState,
    candidate: &AnomalyCandidate,
    radius_km: f64,
    now: DateTime<Utc>,
) -> anyhow::Result<ReconciledAnomaly> {
    let existing = state
        .anomaly_repo
        .find_active_anomaly(&candidate.location)
        .await?;
    let (record, outcome) = merge_candidate(existing.as_ref(), candidate, radius_km, now);
    state.anomaly_repo.upsert_anomaly(&record).await?;
    Ok(ReconciledAnomaly { outcome, record })
}

/// Resolves active records the configured policy considers stale. Records
/// at `failed_locations` qualified this run and are kept as they are.
pub async fn resolve_stale(
    state: &AppState,
    reconciled: &ReconcileReport,
    completed_types: HashSet<AnomalyType>,
    now: DateTime<Utc>,
) -> ResolveReport {
    let policy = state.analyzer.config().resolution;
    let mut report = ResolveReport::default();
    if policy == ResolutionPolicy::Disabled {
        return report;
    }

    let active = match state.anomaly_repo.query_active_anomalies().await {
        Ok(active) => active,
        Err(err) => {
            warn!(error = %err, "failed to load active anomalies for resolution");
            return report;
        }
    };

    let run = RunReaffirmation {
        reaffirmed_ids: reconciled
            .applied
            .iter()
            .map(|item| item.record.id.clone())
            .collect(),
        completed_types,
        failed_locations: reconciled.failed_locations.clone(),
    };
    for stale in stale_records(&active, policy, &run, now) {
        let resolved = resolve_record(&stale, now);
        match state.anomaly_repo.upsert_anomaly(&resolved).await {
            Ok(()) => report.resolved.push(resolved),
            Err(err) => {
                warn!(id = %stale.id, location = %stale.location, error = %err, "failed to resolve anomaly");
                report.failed += 1;
            }
        }
    }
    report
}

/// Resolves one record on request. Already inactive records are returned
/// unchanged. Shares the detection run lock, so it is rejected with
/// `RunInProgress` while a run may be rewriting the same record.
pub async fn resolve_anomaly(state: &AppState, id: &str) -> Result<AnomalyRecord, AppError> {
    let _guard = state
        .run_lock
        .try_lock()
        .map_err(|_| AppError::RunInProgress)?;
    let record = state
        .anomaly_repo
        .fetch_anomaly(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("anomaly '{}'", id)))?;
    if !record.is_active {
        return Ok(record);
    }

    let resolved = resolve_record(&record, Utc::now());
    state.anomaly_repo.upsert_anomaly(&resolved).await?;
    state.metrics.record_resolved(1);
    info!(id = %resolved.id, location = %resolved.location, "anomaly resolved on request");
    Ok(resolved)
}
