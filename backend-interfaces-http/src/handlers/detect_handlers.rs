use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::detection_commands;
use backend_application::queries::detection_queries;
use backend_application::AppState;
use backend_domain::DetectionRunSummary;

use crate::error::HttpError;
use crate::middleware::authorize;

/// Runs detection inline and returns its summary. Answers 409 while another
/// run holds the lock.
pub async fn run_detection(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DetectionRunSummary>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let summary = detection_commands::run_detection(&state).await?;
    Ok(Json(summary))
}

pub async fn last_run(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<DetectionRunSummary>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(detection_queries::last_run(&state).await))
}
