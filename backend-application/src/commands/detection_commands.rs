use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::commands::anomaly_commands::{reconcile_candidates, resolve_stale};
use crate::{AppError, AppState};
use backend_domain::services::AnalysisOutcome;
use backend_domain::{AnomalyRecord, DetectionRunSummary, SeismicEvent};

pub async fn run_detection(state: &AppState) -> Result<DetectionRunSummary, AppError> {
    run_detection_at(state, Utc::now()).await
}

/// One full detection pass against the store as of `now`. The only error is
/// `RunInProgress`; read failures and write failures end up in the summary.
pub async fn run_detection_at(
    state: &AppState,
    now: DateTime<Utc>,
) -> Result<DetectionRunSummary, AppError> {
    let _guard = state.run_lock.try_lock().map_err(|_| {
        state.metrics.record_run_rejected();
        AppError::RunInProgress
    })?;
    let clock = Instant::now();

    let (outcome, recent_events, baseline_events) = match load_snapshot(state, now).await {
        Ok((recent, history)) => (
            state.analyzer.analyze(&recent, &history),
            recent.len(),
            history.len(),
        ),
        Err(err) => {
            warn!(error = %err, "failed to read events for detection");
            (AnalysisOutcome::failed(err.to_string()), 0, 0)
        }
    };

    let reconciled = reconcile_candidates(state, &outcome.candidates, now).await;
    let resolution = resolve_stale(state, &reconciled, outcome.completed_types(), now).await;

    let elapsed = Duration::from_std(clock.elapsed()).unwrap_or_else(|_| Duration::zero());
    let summary = DetectionRunSummary {
        started_at: now,
        finished_at: now + elapsed,
        recent_events,
        baseline_events,
        frequency: outcome.frequency,
        escalation: outcome.escalation,
        qualifying: reconciled.applied,
        resolved: resolution.resolved,
        failed_writes: reconciled.failed + resolution.failed,
    };

    state.metrics.record_run(&summary);
    info!(
        recent_events = summary.recent_events,
        baseline_events = summary.baseline_events,
        frequency = ?summary.frequency,
        escalation = ?summary.escalation,
        inserted = summary.inserted(),
        updated = summary.updated(),
        resolved = summary.resolved.len(),
        failed_writes = summary.failed_writes,
        "detection run finished"
    );

    let alerts = alertable(state, &summary);
    if !alerts.is_empty() {
        state.alert_service.spawn_alerts(state.config.clone(), alerts);
    }

    *state.last_run.write().await = Some(summary.clone());
    Ok(summary)
}

async fn load_snapshot(
    state: &AppState,
    now: DateTime<Utc>,
) -> anyhow::Result<(Vec<SeismicEvent>, Vec<SeismicEvent>)> {
    let recent = state
        .event_repo
        .query_events(state.analyzer.detection_range(now))
        .await?;
    let history = state
        .event_repo
        .query_events(state.analyzer.baseline_range(now))
        .await?;
    Ok((recent, history))
}

fn alertable(state: &AppState, summary: &DetectionRunSummary) -> Vec<AnomalyRecord> {
    summary
        .qualifying
        .iter()
        .filter(|item| item.record.alert_level >= state.config.alert_min_level)
        .map(|item| item.record.clone())
        .collect()
}
