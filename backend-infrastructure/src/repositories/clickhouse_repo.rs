use anyhow::{bail, Result};
use async_trait::async_trait;
use clickhouse::{Client, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use backend_domain::ports::{AnomalyRepository, EventRepository};
use backend_domain::{
    AlertLevel, AnomalyRecord, AnomalyType, EventSource, SeismicEvent, TimeRange,
};

use crate::utils::{offset_to_utc, utc_to_offset};

#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct EarthquakeRow {
    pub event_id: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub event_time: OffsetDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: f64,
    pub depth_km: f64,
    pub location: String,
    pub source: String,
}

impl From<&SeismicEvent> for EarthquakeRow {
    fn from(event: &SeismicEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            event_time: utc_to_offset(event.timestamp),
            latitude: event.latitude,
            longitude: event.longitude,
            magnitude: event.magnitude,
            depth_km: event.depth_km,
            location: event.location.clone(),
            source: event.source.as_str().to_string(),
        }
    }
}

impl From<EarthquakeRow> for SeismicEvent {
    fn from(row: EarthquakeRow) -> Self {
        Self {
            event_id: row.event_id,
            timestamp: offset_to_utc(row.event_time),
            latitude: row.latitude,
            longitude: row.longitude,
            magnitude: row.magnitude,
            depth_km: row.depth_km,
            location: row.location,
            source: EventSource::from(row.source.as_str()),
        }
    }
}

#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct AnomalyRow {
    pub id: String,
    pub location: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
    pub score: f64,
    pub event_count: u32,
    pub baseline_rate: Option<f64>,
    pub current_rate: Option<f64>,
    pub alert_level: String,
    pub anomaly_type: String,
    pub description: String,
    pub is_active: u8,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub first_detected_at: OffsetDateTime,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub detected_at: OffsetDateTime,
    #[serde(with = "clickhouse::serde::time::datetime64::millis::option")]
    pub resolved_at: Option<OffsetDateTime>,
    pub revision: u64,
}

impl From<&AnomalyRecord> for AnomalyRow {
    fn from(record: &AnomalyRecord) -> Self {
        Self {
            id: record.id.clone(),
            location: record.location.clone(),
            center_lat: record.center_lat,
            center_lon: record.center_lon,
            radius_km: record.radius_km,
            score: record.score,
            event_count: record.event_count,
            baseline_rate: record.baseline_rate,
            current_rate: record.current_rate,
            alert_level: record.alert_level.as_str().to_string(),
            anomaly_type: record.anomaly_type.as_str().to_string(),
            description: record.description.clone(),
            is_active: u8::from(record.is_active),
            first_detected_at: utc_to_offset(record.first_detected_at),
            detected_at: utc_to_offset(record.detected_at),
            resolved_at: record.resolved_at.map(utc_to_offset),
            revision: record.revision,
        }
    }
}

impl From<AnomalyRow> for AnomalyRecord {
    fn from(row: AnomalyRow) -> Self {
        Self {
            id: row.id,
            location: row.location,
            center_lat: row.center_lat,
            center_lon: row.center_lon,
            radius_km: row.radius_km,
            score: row.score,
            event_count: row.event_count,
            baseline_rate: row.baseline_rate,
            current_rate: row.current_rate,
            alert_level: AlertLevel::from(row.alert_level.as_str()),
            anomaly_type: AnomalyType::from(row.anomaly_type.as_str()),
            description: row.description,
            is_active: row.is_active != 0,
            first_detected_at: offset_to_utc(row.first_detected_at),
            detected_at: offset_to_utc(row.detected_at),
            resolved_at: row.resolved_at.map(offset_to_utc),
            revision: row.revision,
        }
    }
}

/// Event and anomaly store on ClickHouse. Both tables are
/// `ReplacingMergeTree`s read with `FINAL`, so a re-inserted event id or a
/// higher anomaly revision replaces the earlier row.
#[derive(Clone)]
pub struct ClickhouseRepo {
    client: Client,
    database: String,
}

impl ClickhouseRepo {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    async fn existing_event_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let existing = self
            .client
            .query("SELECT event_id FROM earthquakes WHERE has(?, event_id)")
            .bind(ids)
            .fetch_all::<String>()
            .await?;
        Ok(existing)
    }
}

#[async_trait]
impl EventRepository for ClickhouseRepo {
    async fn ensure_schema(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;

        let create_events = r#"
CREATE TABLE IF NOT EXISTS earthquakes (
    event_id String,
    event_time DateTime64(3, 'UTC'),
    latitude Float64,
    longitude Float64,
    magnitude Float64,
    depth_km Float64,
    location String,
    source LowCardinality(String)
) ENGINE = ReplacingMergeTree
PARTITION BY toYYYYMM(event_time)
ORDER BY event_id
"#;
        self.client.query(create_events).execute().await?;

        let create_anomalies = r#"
CREATE TABLE IF NOT EXISTS anomalies (
    id String,
    location String,
    center_lat Float64,
    center_lon Float64,
    radius_km Float64,
    score Float64,
    event_count UInt32,
    baseline_rate Nullable(Float64),
    current_rate Nullable(Float64),
    alert_level LowCardinality(String),
    anomaly_type LowCardinality(String),
    description String,
    is_active UInt8,
    first_detected_at DateTime64(3, 'UTC'),
    detected_at DateTime64(3, 'UTC'),
    resolved_at Nullable(DateTime64(3, 'UTC')),
    revision UInt64
) ENGINE = ReplacingMergeTree(revision)
ORDER BY id
"#;
        self.client.query(create_anomalies).execute().await?;
        Ok(())
    }

    async fn insert_events(&self, events: &[SeismicEvent]) -> Result<usize> {
        let mut ids: Vec<String> = events.iter().map(|event| event.event_id.clone()).collect();
        ids.sort();
        ids.dedup();
        let existing = self.existing_event_ids(&ids).await?;

        let mut seen = std::collections::HashSet::new();
        let fresh: Vec<&SeismicEvent> = events
            .iter()
            .filter(|event| !existing.contains(&event.event_id))
            .filter(|event| seen.insert(event.event_id.clone()))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        let mut insert = self.client.insert("earthquakes")?;
        for event in &fresh {
            insert.write(&EarthquakeRow::from(*event)).await?;
        }
        insert.end().await?;
        Ok(fresh.len())
    }

    async fn query_events(&self, range: TimeRange) -> Result<Vec<SeismicEvent>> {
        let rows = self
            .client
            .query(
                "SELECT ?fields FROM earthquakes FINAL \
                 WHERE toUnixTimestamp64Milli(event_time) >= ? \
                 AND toUnixTimestamp64Milli(event_time) <= ? \
                 ORDER BY event_time",
            )
            .bind(range.start.timestamp_millis())
            .bind(range.end.timestamp_millis())
            .fetch_all::<EarthquakeRow>()
            .await?;
        Ok(rows.into_iter().map(SeismicEvent::from).collect())
    }

    async fn fetch_event(&self, event_id: &str) -> Result<Option<SeismicEvent>> {
        let row = self
            .client
            .query("SELECT ?fields FROM earthquakes FINAL WHERE event_id = ? LIMIT 1")
            .bind(event_id)
            .fetch_optional::<EarthquakeRow>()
            .await?;
        Ok(row.map(SeismicEvent::from))
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}

#[async_trait]
impl AnomalyRepository for ClickhouseRepo {
    async fn find_active_anomaly(&self, location: &str) -> Result<Option<AnomalyRecord>> {
        let row = self
            .client
            .query(
                "SELECT ?fields FROM anomalies FINAL \
                 WHERE location = ? AND is_active = 1 \
                 ORDER BY detected_at DESC LIMIT 1",
            )
            .bind(location)
            .fetch_optional::<AnomalyRow>()
            .await?;
        Ok(row.map(AnomalyRecord::from))
    }

    async fn upsert_anomaly(&self, record: &AnomalyRecord) -> Result<()> {
        if record.is_active {
            if let Some(active) = self.find_active_anomaly(&record.location).await? {
                if active.id != record.id {
                    bail!(
                        "location '{}' already has active anomaly {}",
                        record.location,
                        active.id
                    );
                }
            }
        }
        let mut insert = self.client.insert("anomalies")?;
        insert.write(&AnomalyRow::from(record)).await?;
        insert.end().await?;
        Ok(())
    }

    async fn fetch_anomaly(&self, id: &str) -> Result<Option<AnomalyRecord>> {
        let row = self
            .client
            .query("SELECT ?fields FROM anomalies FINAL WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional::<AnomalyRow>()
            .await?;
        Ok(row.map(AnomalyRecord::from))
    }

    async fn query_active_anomalies(&self) -> Result<Vec<AnomalyRecord>> {
        let rows = self
            .client
            .query("SELECT ?fields FROM anomalies FINAL WHERE is_active = 1 ORDER BY detected_at DESC")
            .fetch_all::<AnomalyRow>()
            .await?;
        Ok(rows.into_iter().map(AnomalyRecord::from).collect())
    }

    async fn fetch_anomalies_between(&self, range: TimeRange) -> Result<Vec<AnomalyRecord>> {
        let rows = self
            .client
            .query(
                "SELECT ?fields FROM anomalies FINAL \
                 WHERE toUnixTimestamp64Milli(detected_at) >= ? \
                 AND toUnixTimestamp64Milli(detected_at) <= ? \
                 ORDER BY detected_at DESC",
            )
            .bind(range.start.timestamp_millis())
            .bind(range.end.timestamp_millis())
            .fetch_all::<AnomalyRow>()
            .await?;
        Ok(rows.into_iter().map(AnomalyRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn anomaly_rows_round_trip_optional_fields() {
        let detected = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        let record = AnomalyRecord {
            id: "a1".to_string(),
            location: "SOMA (MANISA)".to_string(),
            center_lat: 39.15,
            center_lon: 27.45,
            radius_km: 50.0,
            score: 3.9,
            event_count: 6,
            baseline_rate: None,
            current_rate: None,
            alert_level: AlertLevel::Orange,
            anomaly_type: AnomalyType::MagnitudeEscalation,
            description: "escalation".to_string(),
            is_active: false,
            first_detected_at: detected,
            detected_at: detected,
            resolved_at: Some(detected),
            revision: 4,
        };
        let row = AnomalyRow::from(&record);
        assert_eq!(row.is_active, 0);
        assert_eq!(row.alert_level, "orange");
        assert_eq!(row.anomaly_type, "magnitude_escalation");
        assert_eq!(AnomalyRecord::from(row), record);
    }
}
