use chrono::{DateTime, Utc};
use tracing::error;

use crate::{AppError, AppState};
use backend_domain::utils::bounding_box;
use backend_domain::{
    EventList, EventQuery, EventSource, EventStats, RegionQuery, RegionStats, SeismicEvent,
    TimeRange,
};

const DEFAULT_HOURS: i64 = 48;
const MAX_HOURS: i64 = 24 * 90;
const DEFAULT_MIN_MAGNITUDE: f64 = 2.5;
const DEFAULT_REGION_RADIUS_KM: f64 = 50.0;
const DEFAULT_REGION_HOURS: i64 = 168;
const REGION_EVENT_LIMIT: usize = 20;

pub async fn list_events(state: &AppState, query: EventQuery) -> Result<EventList, AppError> {
    let hours = validate_hours(query.hours.unwrap_or(DEFAULT_HOURS))?;
    let min_magnitude = query.min_magnitude.unwrap_or(DEFAULT_MIN_MAGNITUDE);
    let source = parse_source_filter(query.source.as_deref())?;

    let mut events = fetch_window(state, TimeRange::last_hours(Utc::now(), hours)).await?;
    events.retain(|event| {
        event.magnitude >= min_magnitude && source.map_or(true, |source| event.source == source)
    });
    sort_newest_first(&mut events);
    Ok(EventList {
        count: events.len(),
        earthquakes: events,
    })
}

pub async fn get_event(state: &AppState, event_id: &str) -> Result<SeismicEvent, AppError> {
    state
        .event_repo
        .fetch_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event '{}'", event_id)))
}

pub async fn event_stats(state: &AppState) -> Result<EventStats, AppError> {
    event_stats_at(state, Utc::now()).await
}

pub async fn event_stats_at(state: &AppState, now: DateTime<Utc>) -> Result<EventStats, AppError> {
    let events = fetch_window(state, TimeRange::last_hours(now, 24)).await?;
    let active = state.anomaly_repo.query_active_anomalies().await?;
    Ok(EventStats {
        total_24h: events.len(),
        max_magnitude_24h: events.iter().map(|event| event.magnitude).fold(0.0, f64::max),
        active_anomalies: active.len(),
        last_update: events.iter().map(|event| event.timestamp).max(),
    })
}

pub async fn region_stats(state: &AppState, query: RegionQuery) -> Result<RegionStats, AppError> {
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lon) {
        return Err(AppError::BadRequest("lat/lon out of range".to_string()));
    }
    let radius_km = query.radius_km.unwrap_or(DEFAULT_REGION_RADIUS_KM);
    if !(radius_km > 0.0) {
        return Err(AppError::BadRequest("radius_km must be > 0".to_string()));
    }
    let hours = validate_hours(query.hours.unwrap_or(DEFAULT_REGION_HOURS))?;

    let (lat_min, lat_max, lon_min, lon_max) = bounding_box(query.lat, query.lon, radius_km);
    let mut events = fetch_window(state, TimeRange::last_hours(Utc::now(), hours)).await?;
    events.retain(|event| {
        (lat_min..=lat_max).contains(&event.latitude) && (lon_min..=lon_max).contains(&event.longitude)
    });
    sort_newest_first(&mut events);

    let count = events.len();
    let max_magnitude = events.iter().map(|event| event.magnitude).fold(0.0, f64::max);
    let avg_magnitude = if count == 0 {
        0.0
    } else {
        events.iter().map(|event| event.magnitude).sum::<f64>() / count as f64
    };
    events.truncate(REGION_EVENT_LIMIT);
    Ok(RegionStats {
        count,
        max_magnitude,
        avg_magnitude,
        earthquakes: events,
    })
}

async fn fetch_window(state: &AppState, range: TimeRange) -> Result<Vec<SeismicEvent>, AppError> {
    state.event_repo.query_events(range).await.map_err(|err| {
        error!("failed to query events: {}", err);
        AppError::Internal(err)
    })
}

fn validate_hours(hours: i64) -> Result<i64, AppError> {
    if hours <= 0 || hours > MAX_HOURS {
        return Err(AppError::BadRequest(format!(
            "hours must be between 1 and {}",
            MAX_HOURS
        )));
    }
    Ok(hours)
}

/// `None` means every source.
fn parse_source_filter(raw: Option<&str>) -> Result<Option<EventSource>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => match EventSource::from(value) {
            EventSource::Unknown => Err(AppError::BadRequest(format!("unknown source '{}'", value))),
            source => Ok(Some(source)),
        },
    }
}

fn sort_newest_first(events: &mut [SeismicEvent]) {
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_filter_accepts_all_and_known_sources() {
        assert_eq!(parse_source_filter(None).unwrap(), None);
        assert_eq!(parse_source_filter(Some("ALL")).unwrap(), None);
        assert_eq!(parse_source_filter(Some("usgs")).unwrap(), Some(EventSource::Usgs));
        assert_eq!(
            parse_source_filter(Some("Kandilli")).unwrap(),
            Some(EventSource::Kandilli)
        );
        assert!(parse_source_filter(Some("emsc")).is_err());
    }

    #[test]
    fn hours_are_bounded() {
        assert!(validate_hours(0).is_err());
        assert!(validate_hours(48).is_ok());
        assert!(validate_hours(MAX_HOURS + 1).is_err());
    }
}
