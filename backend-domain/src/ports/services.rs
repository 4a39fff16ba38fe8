use async_trait::async_trait;

use crate::entities::{AlertDeliveryRecord, AnomalyRecord, RuntimeConfig, SeismicEvent};
use crate::value_objects::EventSource;

#[async_trait]
pub trait AlertService: Send + Sync {
    fn spawn_alerts(&self, config: RuntimeConfig, anomalies: Vec<AnomalyRecord>);
    async fn check_alert_target(&self, config: &RuntimeConfig) -> anyhow::Result<()>;
    async fn list_alert_deliveries(&self, limit: usize) -> Vec<AlertDeliveryRecord>;
    async fn last_alert_delivery(&self) -> Option<AlertDeliveryRecord>;
}

#[async_trait]
pub trait HealthCheckService: Send + Sync {
    async fn check_database(&self) -> anyhow::Result<bool>;
    async fn check_alert_target(&self) -> anyhow::Result<bool>;
}

/// A pull-based feed of recent earthquakes.
#[async_trait]
pub trait EventCollector: Send + Sync {
    fn source(&self) -> EventSource;
    async fn fetch_recent(&self) -> anyhow::Result<Vec<SeismicEvent>>;
}
