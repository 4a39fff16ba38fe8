use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use encoding_rs::WINDOWS_1254;
use reqwest::Client;
use tracing::debug;

use backend_domain::ports::EventCollector;
use backend_domain::{EventSource, SeismicEvent};

/// KOERI listings are stamped in Turkey time.
const TURKEY_OFFSET_SECONDS: i32 = 3 * 3600;
const MISSING_MAGNITUDE: &str = "-.-";

/// Kandilli Observatory (KOERI) plain-text listing of recent events.
pub struct KandilliCollector {
    client: Client,
    url: String,
}

impl KandilliCollector {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl EventCollector for KandilliCollector {
    fn source(&self) -> EventSource {
        EventSource::Kandilli
    }

    async fn fetch_recent(&self) -> Result<Vec<SeismicEvent>> {
        let bytes = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let events = parse_kandilli_listing(&decode_listing(&bytes));
        debug!(count = events.len(), "parsed Kandilli listing");
        Ok(events)
    }
}

/// The listing is labelled ISO-8859-9 but occasionally carries CP1254 bytes;
/// windows-1254 is a superset of both.
pub fn decode_listing(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1254.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Parses `date time lat lon depth MD ML Mw location...` rows. Anything that
/// does not start with a `YYYY.MM.DD` date is treated as header or markup.
pub fn parse_kandilli_listing(text: &str) -> Vec<SeismicEvent> {
    text.lines().filter_map(parse_row).collect()
}

fn parse_row(line: &str) -> Option<SeismicEvent> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return None;
    }
    let timestamp = parse_turkey_time(parts[0], parts[1])?;
    let latitude: f64 = parts[2].parse().ok()?;
    let longitude: f64 = parts[3].parse().ok()?;
    let depth_km: f64 = parts[4].parse().ok()?;
    let magnitude = parts[5..8]
        .iter()
        .filter(|value| **value != MISSING_MAGNITUDE)
        .filter_map(|value| value.parse::<f64>().ok())
        .fold(None, |best: Option<f64>, value| Some(best.map_or(value, |b| b.max(value))))?;

    Some(SeismicEvent {
        event_id: format!(
            "{}_{}_{}_{:.2}_{:.2}",
            EventSource::Kandilli.key_prefix(),
            parts[0].replace('.', ""),
            parts[1].replace(':', ""),
            latitude,
            longitude
        ),
        timestamp,
        latitude,
        longitude,
        magnitude,
        depth_km,
        location: parts[8..].join(" "),
        source: EventSource::Kandilli,
    })
}

fn parse_turkey_time(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y.%m.%d %H:%M:%S").ok()?;
    let offset = FixedOffset::east_opt(TURKEY_OFFSET_SECONDS)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|value| value.with_timezone(&Utc))
}
