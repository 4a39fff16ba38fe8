use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::anomaly_commands;
use backend_application::queries::anomaly_queries;
use backend_application::AppState;
use backend_domain::{AnomalyList, AnomalyRecord};

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn list_anomalies(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AnomalyList>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let list = anomaly_queries::list_active_anomalies(&state).await?;
    Ok(Json(list))
}

pub async fn resolve_anomaly(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AnomalyRecord>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let record = anomaly_commands::resolve_anomaly(&state, &id).await?;
    Ok(Json(record))
}
