use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use backend_domain::ports::EventCollector;
use backend_domain::{EventSource, SeismicEvent};

const DEFAULT_LOCATION: &str = "Türkiye";

/// AFAD event filter API.
pub struct AfadCollector {
    client: Client,
    url: String,
    lookback_days: i64,
}

impl AfadCollector {
    pub fn new(client: Client, url: String, lookback_days: i64) -> Self {
        Self {
            client,
            url,
            lookback_days,
        }
    }
}

#[async_trait]
impl EventCollector for AfadCollector {
    fn source(&self) -> EventSource {
        EventSource::Afad
    }

    async fn fetch_recent(&self) -> Result<Vec<SeismicEvent>> {
        let end = Utc::now();
        let start = end - Duration::days(self.lookback_days);
        let payload = json!({
            "start": start.format("%Y-%m-%d").to_string(),
            "end": end.format("%Y-%m-%d").to_string(),
        });
        let body: Value = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let events = parse_afad_response(&body);
        debug!(count = events.len(), "parsed AFAD response");
        Ok(events)
    }
}

/// Accepts a bare array or an object wrapping it in `data` or `result`.
pub fn parse_afad_response(body: &Value) -> Vec<SeismicEvent> {
    let rows: &[Value] = match body {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => map
            .get("data")
            .or_else(|| map.get("result"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };
    rows.iter().filter_map(parse_row).collect()
}

fn parse_row(row: &Value) -> Option<SeismicEvent> {
    let id = text(row, &["eventID", "geoid", "id"])?;
    let timestamp = parse_afad_time(&text(row, &["eventDate", "date", "dateTime"])?)?;
    let coordinates = row.pointer("/geojson/coordinates");
    let latitude = number(row, &["latitude", "lat"])
        .or_else(|| coordinates.and_then(|c| c.get(1)).and_then(as_f64))
        .unwrap_or(0.0);
    let longitude = number(row, &["longitude", "lon"])
        .or_else(|| coordinates.and_then(|c| c.get(0)).and_then(as_f64))
        .unwrap_or(0.0);
    let magnitude = number(row, &["magnitude", "mag", "ml"]).unwrap_or(0.0);
    if magnitude == 0.0 || latitude == 0.0 || longitude == 0.0 {
        return None;
    }

    Some(SeismicEvent {
        event_id: format!("{}_{}", EventSource::Afad.key_prefix(), id),
        timestamp,
        latitude,
        longitude,
        magnitude,
        depth_km: number(row, &["depth"]).unwrap_or(0.0),
        location: text(row, &["location", "title", "locationTr"])
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        source: EventSource::Afad,
    })
}

/// RFC 3339 timestamps keep their offset; naive timestamps are taken as UTC.
fn parse_afad_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn text(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match row.get(*key)? {
        Value::String(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    })
}

fn number(row: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| row.get(*key).and_then(as_f64))
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_field_aliases_and_wrappers() {
        let body = json!({
            "data": [
                {
                    "eventID": "612345",
                    "date": "2024-05-03T11:21:07",
                    "latitude": "39.1235",
                    "longitude": "27.4512",
                    "magnitude": "3.4",
                    "depth": "7.1",
                    "location": "Soma (Manisa)"
                },
                {
                    "id": 77,
                    "eventDate": "2024-05-03 10:00:00",
                    "geojson": {"coordinates": [29.91, 40.77]},
                    "ml": 2.1,
                    "title": "Izmit Korfezi"
                }
            ]
        });
        let events = parse_afad_response(&body);
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].event_id, "afad_612345");
        assert_eq!(events[0].magnitude, 3.4);
        assert_eq!(events[0].depth_km, 7.1);
        assert_eq!(
            events[0].timestamp,
            Utc.with_ymd_and_hms(2024, 5, 3, 11, 21, 7).unwrap()
        );

        assert_eq!(events[1].event_id, "afad_77");
        assert_eq!(events[1].latitude, 40.77);
        assert_eq!(events[1].longitude, 29.91);
        assert_eq!(events[1].location, "Izmit Korfezi");
    }

    #[test]
    fn skips_rows_with_zero_magnitude_or_coordinates() {
        let body = json!([
            {"eventID": "1", "date": "2024-05-03T11:21:07Z", "latitude": 39.0, "longitude": 27.0, "magnitude": 0},
            {"eventID": "2", "date": "2024-05-03T11:21:07Z", "latitude": 0, "longitude": 27.0, "magnitude": 3.0},
            {"eventID": "3", "date": "not a date", "latitude": 39.0, "longitude": 27.0, "magnitude": 3.0},
            {"eventID": "4", "date": "2024-05-03T11:21:07+03:00", "latitude": 39.0, "longitude": 27.0, "magnitude": 3.0}
        ]);
        let events = parse_afad_response(&body);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id, "afad_4");
        assert_eq!(events[0].location, DEFAULT_LOCATION);
        assert_eq!(
            events[0].timestamp,
            Utc.with_ymd_and_hms(2024, 5, 3, 8, 21, 7).unwrap()
        );
    }
}
