use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::queries::event_queries;
use backend_application::AppState;
use backend_domain::{EventList, EventQuery, EventStats, RegionQuery, RegionStats, SeismicEvent};

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn list_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<EventQuery>,
) -> Result<Json<EventList>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let list = event_queries::list_events(&state, query).await?;
    Ok(Json(list))
}

pub async fn get_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Json<SeismicEvent>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let event = event_queries::get_event(&state, &event_id).await?;
    Ok(Json(event))
}

pub async fn event_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<EventStats>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let stats = event_queries::event_stats(&state).await?;
    Ok(Json(stats))
}

pub async fn region_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RegionQuery>,
) -> Result<Json<RegionStats>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let stats = event_queries::region_stats(&state, query).await?;
    Ok(Json(stats))
}
