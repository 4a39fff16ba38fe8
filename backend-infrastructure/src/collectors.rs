pub mod afad;
pub mod kandilli;
pub mod usgs;

pub use afad::*;
pub use kandilli::*;
pub use usgs::*;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;

use backend_domain::ports::EventCollector;
use backend_domain::EventSource;

use crate::config::AppConfig;

/// Builds one collector per enabled source, sharing a single HTTP client.
pub fn build_collectors(config: &AppConfig) -> Result<Vec<Arc<dyn EventCollector>>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds.max(3)))
        .user_agent(concat!("faultline/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let settings = &config.collectors;
    let mut collectors: Vec<Arc<dyn EventCollector>> = Vec::new();
    for source in config.sources()? {
        match source {
            EventSource::Usgs => collectors.push(Arc::new(UsgsCollector::new(
                client.clone(),
                settings.usgs_url.clone(),
                settings.usgs_lookback_days,
                settings.usgs_min_magnitude,
                settings.usgs_limit,
            ))),
            EventSource::Kandilli => collectors.push(Arc::new(KandilliCollector::new(
                client.clone(),
                settings.kandilli_url.clone(),
            ))),
            EventSource::Afad => collectors.push(Arc::new(AfadCollector::new(
                client.clone(),
                settings.afad_url.clone(),
                settings.afad_lookback_days,
            ))),
            EventSource::Unknown => {}
        }
    }
    Ok(collectors)
}
