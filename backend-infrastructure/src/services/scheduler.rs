use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use backend_application::commands::{collect_commands, detection_commands};
use backend_application::{AppError, AppState};

/// Polls every collector each `collect_interval_minutes`, starting now.
pub async fn schedule_collection(state: AppState) {
    let mut ticker = interval(minutes(state.config.collect_interval_minutes));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let summary = collect_commands::collect_all(&state).await;
        info!(
            sources = summary.sources.len(),
            inserted = summary.inserted(),
            "scheduled collection finished"
        );
    }
}

/// Runs detection each `detect_interval_minutes`, starting now. A tick that
/// finds a run already in progress is skipped.
pub async fn schedule_detection(state: AppState) {
    let mut ticker = interval(minutes(state.config.detect_interval_minutes));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        match detection_commands::run_detection(&state).await {
            Ok(_) => {}
            Err(AppError::RunInProgress) => warn!("detection run already in progress, skipping tick"),
            Err(err) => error!("scheduled detection failed: {}", err),
        }
    }
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.max(1) * 60)
}
