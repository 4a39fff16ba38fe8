use tracing::error;

use crate::{AppError, AppState};
use backend_domain::AnomalyList;

/// Active anomalies, most severe first.
pub async fn list_active_anomalies(state: &AppState) -> Result<AnomalyList, AppError> {
    let mut anomalies = state
        .anomaly_repo
        .query_active_anomalies()
        .await
        .map_err(|err| {
            error!("failed to fetch anomalies: {}", err);
            AppError::Internal(err)
        })?;
    anomalies.sort_by(|a, b| {
        b.alert_level
            .cmp(&a.alert_level)
            .then_with(|| b.score.total_cmp(&a.score))
    });
    Ok(AnomalyList {
        count: anomalies.len(),
        anomalies,
    })
}
