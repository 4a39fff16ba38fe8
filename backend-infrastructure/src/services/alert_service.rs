use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use backend_domain::ports::AlertService;
use backend_domain::utils::current_millis;
use backend_domain::{AlertDeliveryRecord, AnomalyRecord, RuntimeConfig};

const MAX_DELIVERY_HISTORY: usize = 200;
const MAX_ALERT_LINES: usize = 8;
const DEFAULT_ALERT_TEMPLATE: &str = r#"{"text":"Faultline: {total} seismic anomalies\n{lines}"}"#;

/// Posts anomaly alerts to an HTTP webhook and keeps a bounded delivery log.
#[derive(Default, Clone)]
pub struct WebhookAlertService {
    deliveries: Arc<Mutex<VecDeque<AlertDeliveryRecord>>>,
}

impl WebhookAlertService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertService for WebhookAlertService {
    fn spawn_alerts(&self, config: RuntimeConfig, anomalies: Vec<AnomalyRecord>) {
        if anomalies.is_empty() {
            return;
        }
        let Some(url) = config.alert_webhook_url.clone() else {
            debug!(count = anomalies.len(), "alert webhook not configured, skipping");
            return;
        };
        let deliveries = self.deliveries.clone();
        tokio::spawn(async move {
            let result = send_alerts(&config, &url, &anomalies).await;
            let record = AlertDeliveryRecord {
                timestamp_ms: current_millis(),
                status: if result.is_ok() { "ok" } else { "failed" }.to_string(),
                mode: "webhook".to_string(),
                alert_count: anomalies.len(),
                locations: anomalies.iter().map(|record| record.location.clone()).collect(),
                error: result.as_ref().err().map(|err| err.to_string()),
            };
            match &result {
                Ok(()) => info!(count = anomalies.len(), "alert webhook delivered"),
                Err(err) => warn!("alert webhook failed: {}", err),
            }
            push_delivery(&deliveries, record).await;
        });
    }

    async fn check_alert_target(&self, config: &RuntimeConfig) -> Result<()> {
        let url = config
            .alert_webhook_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("alert webhook url not configured"))?;
        let response = http_client(config)?.get(url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("alert webhook responded {}", response.status());
        }
        Ok(())
    }

    async fn list_alert_deliveries(&self, limit: usize) -> Vec<AlertDeliveryRecord> {
        let deliveries = self.deliveries.lock().await;
        deliveries.iter().rev().take(limit).cloned().collect()
    }

    async fn last_alert_delivery(&self) -> Option<AlertDeliveryRecord> {
        self.deliveries.lock().await.back().cloned()
    }
}

async fn push_delivery(deliveries: &Mutex<VecDeque<AlertDeliveryRecord>>, record: AlertDeliveryRecord) {
    let mut deliveries = deliveries.lock().await;
    if deliveries.len() >= MAX_DELIVERY_HISTORY {
        deliveries.pop_front();
    }
    deliveries.push_back(record);
}

fn http_client(config: &RuntimeConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds.max(3)))
        .build()?)
}

async fn send_alerts(config: &RuntimeConfig, url: &str, alerts: &[AnomalyRecord]) -> Result<()> {
    let template = config
        .alert_webhook_template
        .as_deref()
        .unwrap_or(DEFAULT_ALERT_TEMPLATE);
    let payload = build_payload(alerts, template);

    http_client(config)?
        .post(url)
        .header("Content-Type", "application/json")
        .body(payload)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

fn alert_line(record: &AnomalyRecord) -> String {
    format!(
        "[{}] {} | {} | score {:.2} | {} events",
        record.alert_level.as_str().to_uppercase(),
        record.location,
        record.anomaly_type.as_str(),
        record.score,
        record.event_count
    )
}

/// Fills `{total}` and `{lines}`. Lines are JSON-escaped since templates are
/// JSON documents.
pub fn build_payload(alerts: &[AnomalyRecord], template: &str) -> String {
    let mut lines = alerts
        .iter()
        .take(MAX_ALERT_LINES)
        .map(|record| escape_json(&alert_line(record)))
        .collect::<Vec<_>>()
        .join("\\n");
    if alerts.len() > MAX_ALERT_LINES {
        lines.push_str(&format!("\\n...and {} more", alerts.len() - MAX_ALERT_LINES));
    }
    template
        .replace("{total}", &alerts.len().to_string())
        .replace("{lines}", &lines)
}

fn escape_json(text: &str) -> String {
    let quoted = serde_json::Value::String(text.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
