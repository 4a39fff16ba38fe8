use std::sync::Arc;

use async_trait::async_trait;
use backend_domain::ports::{AlertService, EventRepository, HealthCheckService};
use backend_domain::RuntimeConfig;

/// Readiness probes for the event store and the alert webhook.
pub struct StoreHealthService {
    event_repo: Arc<dyn EventRepository>,
    alert_service: Arc<dyn AlertService>,
    config: RuntimeConfig,
}

impl StoreHealthService {
    pub fn new(
        event_repo: Arc<dyn EventRepository>,
        alert_service: Arc<dyn AlertService>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            event_repo,
            alert_service,
            config,
        }
    }
}

#[async_trait]
impl HealthCheckService for StoreHealthService {
    async fn check_database(&self) -> anyhow::Result<bool> {
        self.event_repo.ping().await.map(|_| true)
    }

    /// `Ok(false)` when no alert webhook is configured.
    async fn check_alert_target(&self) -> anyhow::Result<bool> {
        if self.config.alert_webhook_url.is_none() {
            return Ok(false);
        }
        self.alert_service
            .check_alert_target(&self.config)
            .await
            .map(|_| true)
    }
}
