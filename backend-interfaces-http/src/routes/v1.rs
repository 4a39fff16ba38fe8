use axum::routing::{get, post};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{anomaly_handlers, detect_handlers, event_handlers, ingest_handlers, ops_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/earthquakes", get(event_handlers::list_events))
        .route("/v1/earthquakes/:event_id", get(event_handlers::get_event))
        .route("/v1/stats", get(event_handlers::event_stats))
        .route("/v1/region-stats", get(event_handlers::region_stats))
        .route("/v1/anomalies", get(anomaly_handlers::list_anomalies))
        .route(
            "/v1/anomalies/:id/resolve",
            post(anomaly_handlers::resolve_anomaly),
        )
        .route("/v1/detect/run", post(detect_handlers::run_detection))
        .route("/v1/detect/last-run", get(detect_handlers::last_run))
        .route("/v1/ingest/events", post(ingest_handlers::ingest_events))
        .route("/v1/ops/collect", post(ops_handlers::trigger_collection))
        .route(
            "/v1/ops/collect/last",
            get(ops_handlers::last_collection),
        )
        .route(
            "/v1/ops/alert-target/check",
            get(ops_handlers::alert_target_check),
        )
        .route(
            "/v1/ops/alert-deliveries",
            get(ops_handlers::list_alert_deliveries),
        )
        .route(
            "/v1/ops/alert-deliveries/last",
            get(ops_handlers::get_last_alert_delivery),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
