use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use backend_domain::ports::EventCollector;
use backend_domain::{EventSource, SeismicEvent};

/// USGS FDSN event service, GeoJSON format.
pub struct UsgsCollector {
    client: Client,
    url: String,
    lookback_days: i64,
    min_magnitude: f64,
    limit: u32,
}

impl UsgsCollector {
    pub fn new(client: Client, url: String, lookback_days: i64, min_magnitude: f64, limit: u32) -> Self {
        Self {
            client,
            url,
            lookback_days,
            min_magnitude,
            limit,
        }
    }
}

#[async_trait]
impl EventCollector for UsgsCollector {
    fn source(&self) -> EventSource {
        EventSource::Usgs
    }

    async fn fetch_recent(&self) -> Result<Vec<SeismicEvent>> {
        let end = Utc::now();
        let start = end - Duration::days(self.lookback_days);
        let body = self
            .client
            .get(&self.url)
            .query(&[
                ("format", "geojson".to_string()),
                ("starttime", start.format("%Y-%m-%dT%H:%M:%S").to_string()),
                ("endtime", end.format("%Y-%m-%dT%H:%M:%S").to_string()),
                ("minmagnitude", self.min_magnitude.to_string()),
                ("limit", self.limit.to_string()),
                ("orderby", "time-asc".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let events = parse_usgs_geojson(&body)?;
        debug!(count = events.len(), "parsed USGS feed");
        Ok(events)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    properties: Properties,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    mag: Option<f64>,
    time: Option<i64>,
    place: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<Option<f64>>,
}

/// Features without a magnitude, time or coordinates are skipped.
pub fn parse_usgs_geojson(body: &str) -> Result<Vec<SeismicEvent>> {
    let collection: FeatureCollection = serde_json::from_str(body)?;
    let events = collection
        .features
        .into_iter()
        .filter_map(|feature| {
            let magnitude = feature.properties.mag?;
            let timestamp = Utc.timestamp_millis_opt(feature.properties.time?).single()?;
            let coordinates = feature.geometry?.coordinates;
            let longitude = (*coordinates.first()?)?;
            let latitude = (*coordinates.get(1)?)?;
            let depth_km = coordinates.get(2).copied().flatten().unwrap_or(0.0);
            Some(SeismicEvent {
                event_id: format!("{}_{}", EventSource::Usgs.key_prefix(), feature.id),
                timestamp,
                latitude,
                longitude,
                magnitude,
                depth_km,
                location: feature
                    .properties
                    .place
                    .unwrap_or_else(|| "Unknown".to_string()),
                source: EventSource::Usgs,
            })
        })
        .collect();
    Ok(events)
}
