use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{AlertLevel, DbConfig, DetectionConfig, EventSource, RuntimeConfig};

use crate::config::validation::{parse_sources, validate_detection};

const ENV_PREFIX: &str = "FAULTLINE_";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub report_dir: String,
    pub public_base_url: String,
    pub report_webhook_url: Option<String>,
    pub report_webhook_template: Option<String>,
    pub alert_webhook_url: Option<String>,
    pub alert_webhook_template: Option<String>,
    pub alert_min_level: AlertLevel,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub report_hour: u32,
    pub report_minute: u32,
    pub collect_interval_minutes: u64,
    pub detect_interval_minutes: u64,
    pub log_dir: Option<String>,
    pub collectors: CollectorsConfig,
    pub detection: DetectionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3234".to_string(),
            api_token: None,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "faultline".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            report_dir: "./reports".to_string(),
            public_base_url: "http://127.0.0.1:3234".to_string(),
            report_webhook_url: None,
            report_webhook_template: None,
            alert_webhook_url: None,
            alert_webhook_template: None,
            alert_min_level: AlertLevel::Yellow,
            max_body_bytes: 8 * 1024 * 1024,
            request_timeout_seconds: 30,
            report_hour: 22,
            report_minute: 0,
            collect_interval_minutes: 15,
            detect_interval_minutes: 30,
            log_dir: None,
            collectors: CollectorsConfig::default(),
            detection: DetectionConfig::default(),
        }
    }
}

/// Feed endpoints and query parameters for the pull collectors.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollectorsConfig {
    /// Enabled sources, by name.
    pub sources: Vec<String>,
    pub usgs_url: String,
    pub usgs_lookback_days: i64,
    pub usgs_min_magnitude: f64,
    pub usgs_limit: u32,
    pub kandilli_url: String,
    pub afad_url: String,
    pub afad_lookback_days: i64,
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            sources: vec!["kandilli".to_string(), "usgs".to_string(), "afad".to_string()],
            usgs_url: "https://earthquake.usgs.gov/fdsnws/event/1/query".to_string(),
            usgs_lookback_days: 7,
            usgs_min_magnitude: 2.5,
            usgs_limit: 1000,
            kandilli_url: "http://www.koeri.boun.edu.tr/scripts/lst0.asp".to_string(),
            afad_url: "https://deprem.afad.gov.tr/apiv2/event/filter".to_string(),
            afad_lookback_days: 7,
        }
    }
}

impl AppConfig {
    /// Loads from `FAULTLINE_CONFIG` (default `./config.toml`).
    pub async fn load() -> Result<Self> {
        let path = env::var("FAULTLINE_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &str) -> Result<Self> {
        let file_path = Path::new(path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            toml::from_str(&content).map_err(|err| anyhow!("invalid config {}: {}", path, err))?
        } else {
            warn!(path = %path, "config file not found, using defaults");
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        for value in [
            &mut self.api_token,
            &mut self.clickhouse_user,
            &mut self.clickhouse_password,
            &mut self.report_webhook_url,
            &mut self.report_webhook_template,
            &mut self.alert_webhook_url,
            &mut self.alert_webhook_template,
            &mut self.log_dir,
        ] {
            if value.as_deref().map_or(false, |text| text.trim().is_empty()) {
                *value = None;
            }
        }
        self.public_base_url = self.public_base_url.trim().trim_end_matches('/').to_string();
        self.collectors.sources = self
            .collectors
            .sources
            .iter()
            .map(|source| source.trim().to_lowercase())
            .filter(|source| !source.is_empty())
            .collect();
        self.collectors.sources.dedup();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.report_dir = resolve_path(base, &self.report_dir);
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.public_base_url.trim().is_empty() {
            return Err(anyhow!("public_base_url must not be empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.report_hour > 23 || self.report_minute > 59 {
            return Err(anyhow!("report_hour or report_minute out of range"));
        }
        if self.collect_interval_minutes == 0 || self.detect_interval_minutes == 0 {
            return Err(anyhow!("scheduler intervals must be greater than 0"));
        }
        if self.collectors.usgs_lookback_days <= 0 || self.collectors.afad_lookback_days <= 0 {
            return Err(anyhow!("collector lookback days must be greater than 0"));
        }
        parse_sources(&self.collectors.sources)?;
        validate_detection(&self.detection)
    }

    pub fn sources(&self) -> Result<Vec<EventSource>> {
        parse_sources(&self.collectors.sources)
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            report_dir: self.report_dir.clone(),
            public_base_url: self.public_base_url.clone(),
            report_webhook_url: self.report_webhook_url.clone(),
            report_webhook_template: self.report_webhook_template.clone(),
            alert_webhook_url: self.alert_webhook_url.clone(),
            alert_webhook_template: self.alert_webhook_template.clone(),
            alert_min_level: self.alert_min_level,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            report_hour: self.report_hour,
            report_minute: self.report_minute,
            collect_interval_minutes: self.collect_interval_minutes,
            detect_interval_minutes: self.detect_interval_minutes,
            detection: self.detection.clone(),
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok());
    }

    /// Applies overrides looked up by unprefixed key, e.g. `BIND_ADDR`.
    /// Unparseable numbers keep the current value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Some(value) = lookup("CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Some(value) = lookup("CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Some(value) = lookup("CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Some(value) = lookup("CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Some(value) = lookup("REPORT_DIR") {
            self.report_dir = value;
        }
        if let Some(value) = lookup("PUBLIC_BASE_URL") {
            self.public_base_url = value;
        }
        if let Some(value) = lookup("REPORT_WEBHOOK_URL") {
            self.report_webhook_url = Some(value);
        }
        if let Some(value) = lookup("REPORT_WEBHOOK_TEMPLATE") {
            self.report_webhook_template = Some(value);
        }
        if let Some(value) = lookup("ALERT_WEBHOOK_URL") {
            self.alert_webhook_url = Some(value);
        }
        if let Some(value) = lookup("ALERT_WEBHOOK_TEMPLATE") {
            self.alert_webhook_template = Some(value);
        }
        if let Some(value) = lookup("ALERT_MIN_LEVEL") {
            self.alert_min_level = AlertLevel::from(value.as_str());
        }
        if let Some(value) = lookup("MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Some(value) = lookup("REPORT_HOUR") {
            self.report_hour = value.parse().unwrap_or(self.report_hour);
        }
        if let Some(value) = lookup("REPORT_MINUTE") {
            self.report_minute = value.parse().unwrap_or(self.report_minute);
        }
        if let Some(value) = lookup("COLLECT_INTERVAL_MINUTES") {
            self.collect_interval_minutes = value.parse().unwrap_or(self.collect_interval_minutes);
        }
        if let Some(value) = lookup("DETECT_INTERVAL_MINUTES") {
            self.detect_interval_minutes = value.parse().unwrap_or(self.detect_interval_minutes);
        }
        if let Some(value) = lookup("LOG_DIR") {
            self.log_dir = Some(value);
        }
        if let Some(value) = lookup("SOURCES") {
            self.collectors.sources = value.split(',').map(ToString::to_string).collect();
        }
        if let Some(value) = lookup("DETECTION_WINDOW_HOURS") {
            self.detection.detection_window_hours =
                value.parse().unwrap_or(self.detection.detection_window_hours);
        }
        if let Some(value) = lookup("BASELINE_DAYS") {
            self.detection.baseline_days = value.parse().unwrap_or(self.detection.baseline_days);
        }
        if let Some(value) = lookup("CELL_SIZE_DEG") {
            self.detection.cell_size_deg = value.parse().unwrap_or(self.detection.cell_size_deg);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use backend_domain::ResolutionPolicy;

    #[test]
    fn detection_table_overrides_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
bind_addr = "0.0.0.0:8080"
alert_min_level = "orange"

[detection]
cell_size_deg = 0.5
baseline_days = 60

[detection.frequency]
red_z = 6.0

[detection.resolution]
mode = "not_reaffirmed"
"#,
        )
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.alert_min_level, AlertLevel::Orange);
        assert_eq!(config.detection.cell_size_deg, 0.5);
        assert_eq!(config.detection.baseline_days, 60);
        assert_eq!(config.detection.detection_window_hours, 48);
        assert_eq!(config.detection.frequency.red_z, 6.0);
        assert_eq!(config.detection.frequency.orange_z, 3.5);
        assert_eq!(config.detection.resolution, ResolutionPolicy::NotReaffirmed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn max_age_resolution_reads_hours() {
        let config: AppConfig = toml::from_str(
            r#"
[detection.resolution]
mode = "max_age"
max_age_hours = 72
"#,
        )
        .unwrap();
        assert_eq!(
            config.detection.resolution,
            ResolutionPolicy::MaxAge { max_age_hours: 72 }
        );
    }

    #[test]
    fn overrides_apply_and_bad_numbers_are_ignored() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("API_TOKEN", "secret"),
            ("REPORT_HOUR", "seven"),
            ("DETECT_INTERVAL_MINUTES", "10"),
            ("SOURCES", "usgs, AFAD"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|value| value.to_string()));
        config.normalize();

        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.report_hour, 22);
        assert_eq!(config.detect_interval_minutes, 10);
        assert_eq!(
            config.sources().unwrap(),
            vec![EventSource::Usgs, EventSource::Afad]
        );
    }

    #[test]
    fn blank_optional_strings_are_cleared() {
        let mut config = AppConfig {
            api_token: Some("  ".to_string()),
            alert_webhook_url: Some(String::new()),
            public_base_url: "http://example.org/".to_string(),
            ..AppConfig::default()
        };
        config.normalize();
        assert_eq!(config.api_token, None);
        assert_eq!(config.alert_webhook_url, None);
        assert_eq!(config.public_base_url, "http://example.org");
    }

    #[test]
    fn relative_report_dir_resolves_against_config_dir() {
        let mut config = AppConfig::default();
        config.resolve_paths(Some(Path::new("/etc/faultline")));
        assert_eq!(config.report_dir, "/etc/faultline/./reports");
    }
}
