use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::{error, info};

use backend_application::commands::collect_commands;
use backend_application::dtos::IngestResult;
use backend_application::AppState;

use crate::error::HttpError;
use crate::middleware::{authorize, parse_envelope};

pub async fn ingest_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<IngestResult>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }

    let envelope = parse_envelope(&headers, &body).map_err(|err| {
        error!(error = %err, "failed to parse ingest body");
        state.metrics.record_ingest_error();
        HttpError::BadRequest(err.to_string())
    })?;

    let result = collect_commands::ingest_events(&state, envelope).await?;
    info!(
        received = result.received,
        inserted = result.inserted,
        rejected = result.rejected,
        "ingested pushed events"
    );
    Ok(Json(result))
}
