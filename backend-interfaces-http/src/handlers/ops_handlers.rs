use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tokio::time::{timeout, Duration};
use tracing::error;

use backend_application::commands::collect_commands;
use backend_application::queries::detection_queries;
use backend_application::AppState;
use backend_domain::{AlertDeliveryRecord, CollectionSummary};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(serde::Serialize)]
struct AlertStatus {
    status: String,
    mode: String,
}

#[derive(serde::Deserialize)]
pub struct AlertDeliveryQuery {
    pub limit: Option<usize>,
}

pub async fn trigger_collection(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CollectionSummary>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(collect_commands::collect_all(&state).await))
}

pub async fn last_collection(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<CollectionSummary>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(detection_queries::last_collection(&state).await))
}

pub async fn alert_target_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let status = |code: StatusCode, label: &str, mode: &str| {
        (
            code,
            Json(AlertStatus {
                status: label.to_string(),
                mode: mode.to_string(),
            }),
        )
            .into_response()
    };

    if !authorize(&state.config, &headers) {
        return status(StatusCode::UNAUTHORIZED, "unauthorized", "unset");
    }

    let mode = if state.config.alert_webhook_url.is_some() {
        "http"
    } else {
        "unset"
    };
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    match timeout(
        Duration::from_secs(timeout_secs),
        state.alert_service.check_alert_target(&state.config),
    )
    .await
    {
        Ok(Ok(())) => status(StatusCode::OK, "ok", mode),
        Ok(Err(err)) => {
            error!(error = %err, "alert target check failed");
            status(StatusCode::SERVICE_UNAVAILABLE, "error", mode)
        }
        Err(_) => {
            error!(timeout_secs, "alert target check timed out");
            status(StatusCode::SERVICE_UNAVAILABLE, "timeout", mode)
        }
    }
}

pub async fn list_alert_deliveries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AlertDeliveryQuery>,
) -> Result<Json<Vec<AlertDeliveryRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let deliveries = state.alert_service.list_alert_deliveries(limit).await;
    Ok(Json(deliveries))
}

pub async fn get_last_alert_delivery(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<AlertDeliveryRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let last = state.alert_service.last_alert_delivery().await;
    Ok(Json(last))
}

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    match timeout(Duration::from_secs(timeout_secs), state.event_repo.ping()).await {
        Ok(Ok(())) => StatusCode::OK,
        Ok(Err(err)) => {
            error!(error = %err, "ready check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(_) => {
            error!(timeout_secs, "ready check timed out");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}
