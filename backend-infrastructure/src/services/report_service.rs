use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use tokio::fs;
use tracing::{error, info};

use backend_application::AppState;
use backend_domain::{
    AlertLevel, AnomalyRecord, ReportSummary, RuntimeConfig, SeismicEvent, TimeRange,
};

const DEFAULT_REPORT_TEMPLATE: &str =
    r#"{"text":"Faultline {date}: {events} events, max M{max_magnitude}, anomalies red {red} / orange {orange} / yellow {yellow} {link}"}"#;
const MAX_REPORT_ROWS: usize = 200;
const TOP_REGION_COUNT: usize = 5;

/// Everything the daily HTML report shows.
#[derive(Debug, Clone)]
pub struct DailyReport {
    pub date: String,
    pub summary: ReportSummary,
    pub strongest: Option<SeismicEvent>,
    pub magnitude_bands: Vec<(&'static str, usize)>,
    pub top_regions: Vec<(String, usize)>,
    pub active: Vec<AnomalyRecord>,
}

pub async fn schedule_reports(state: AppState) {
    loop {
        let Some(next) = next_report_time(&state.config, Local::now()) else {
            error!("could not compute next report time, daily reports disabled");
            return;
        };
        let duration = next.signed_duration_since(Local::now());
        let sleep_ms = duration.num_milliseconds().max(0) as u64;
        tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)).await;

        match generate_daily_report(&state).await {
            Ok(path) => info!(path = %path.display(), "daily report written"),
            Err(err) => error!("report generation failed: {}", err),
        }
    }
}

pub async fn generate_daily_report(state: &AppState) -> Result<PathBuf> {
    let now = Utc::now();
    let date = Local::now().format("%Y-%m-%d").to_string();
    let report = build_daily_report(state, &date, now).await?;

    let report_dir = Path::new(&state.config.report_dir);
    fs::create_dir_all(report_dir).await?;
    let path = report_dir.join(format!("{}.html", date));
    fs::write(&path, render_report(&report)).await?;

    if let Some(url) = &state.config.report_webhook_url {
        let link = format!("{}/reports/{}.html", state.config.public_base_url, date);
        send_webhook(url, state.config.report_webhook_template.as_deref(), &report, &link).await?;
    }
    Ok(path)
}

pub async fn build_daily_report(state: &AppState, date: &str, now: DateTime<Utc>) -> Result<DailyReport> {
    let window = TimeRange::new(now - Duration::hours(24), now);
    let events = state.event_repo.query_events(window).await?;
    let detected = state.anomaly_repo.fetch_anomalies_between(window).await?;
    let mut active = state.anomaly_repo.query_active_anomalies().await?;
    active.sort_by(|a, b| b.alert_level.cmp(&a.alert_level).then_with(|| b.score.total_cmp(&a.score)));

    let level_count = |level: AlertLevel| detected.iter().filter(|record| record.alert_level == level).count() as u64;
    let summary = ReportSummary {
        total_events: events.len(),
        max_magnitude: events.iter().map(|event| event.magnitude).fold(0.0, f64::max),
        red: level_count(AlertLevel::Red),
        orange: level_count(AlertLevel::Orange),
        yellow: level_count(AlertLevel::Yellow),
        active_anomalies: active.len(),
    };

    Ok(DailyReport {
        date: date.to_string(),
        summary,
        strongest: events
            .iter()
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
            .cloned(),
        magnitude_bands: magnitude_bands(&events),
        top_regions: top_regions(&events),
        active,
    })
}

fn magnitude_bands(events: &[SeismicEvent]) -> Vec<(&'static str, usize)> {
    let count = |low: f64, high: f64| {
        events
            .iter()
            .filter(|event| event.magnitude >= low && event.magnitude < high)
            .count()
    };
    vec![
        ("5.0+", count(5.0, f64::INFINITY)),
        ("4.0-4.9", count(4.0, 5.0)),
        ("3.0-3.9", count(3.0, 4.0)),
        ("< 3.0", count(f64::NEG_INFINITY, 3.0)),
    ]
}

/// Province in parentheses if present, else the part after the last `-`.
pub fn region_of(location: &str) -> String {
    if let Some((_, tail)) = location.rsplit_once('(') {
        let region = tail.split(')').next().unwrap_or_default().trim();
        if !region.is_empty() {
            return region.to_string();
        }
    }
    match location.rsplit_once('-') {
        Some((_, tail)) if !tail.trim().is_empty() => tail.trim().to_string(),
        _ => "Other".to_string(),
    }
}

fn top_regions(events: &[SeismicEvent]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for event in events {
        *counts.entry(region_of(&event.location)).or_default() += 1;
    }
    let mut regions: Vec<_> = counts.into_iter().collect();
    regions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    regions.truncate(TOP_REGION_COUNT);
    regions
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_report(report: &DailyReport) -> String {
    let summary = &report.summary;
    let mut rows = String::new();
    for record in report.active.iter().take(MAX_REPORT_ROWS) {
        rows.push_str(&format!(
            "<tr class=\"level-{level}\"><td>{location}</td><td>{kind}</td>\
             <td><span class=\"badge\">{level}</span></td><td class=\"num\">{score:.2}</td>\
             <td class=\"num\">{count}</td><td>{since}</td><td>{description}</td></tr>",
            level = record.alert_level.as_str(),
            location = escape_html(&record.location),
            kind = record.anomaly_type.as_str(),
            score = record.score,
            count = record.event_count,
            since = record.first_detected_at.format("%Y-%m-%d %H:%M UTC"),
            description = escape_html(&record.description),
        ));
    }
    if rows.is_empty() {
        rows.push_str("<tr><td colspan=\"7\" class=\"empty\">No active anomalies.</td></tr>");
    }

    let bands = report
        .magnitude_bands
        .iter()
        .map(|(band, count)| format!("<li><strong>M{}</strong>: {}</li>", band, count))
        .collect::<String>();
    let regions = report
        .top_regions
        .iter()
        .map(|(region, count)| format!("<li><strong>{}</strong>: {}</li>", escape_html(region), count))
        .collect::<String>();
    let strongest = report
        .strongest
        .as_ref()
        .map(|event| {
            format!(
                "M{:.1} {} at {}",
                event.magnitude,
                escape_html(&event.location),
                event.timestamp.format("%H:%M UTC")
            )
        })
        .unwrap_or_else(|| "none".to_string());

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>Faultline Report {date}</title>
<style>
body {{ margin: 0; font-family: "IBM Plex Sans", sans-serif; background: #0f172a; color: #e2e8f0; }}
.page {{ max-width: 1100px; margin: 0 auto; padding: 32px 20px 48px; }}
.summary {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 12px; margin: 18px 0; }}
.card {{ background: #ffffff; color: #0f172a; padding: 14px 16px; border-radius: 12px; }}
.card .label {{ font-size: 11px; text-transform: uppercase; letter-spacing: 0.1em; color: #64748b; }}
.card .value {{ font-size: 22px; font-weight: 700; margin-top: 6px; }}
.lists {{ display: grid; grid-template-columns: 1fr 1fr; gap: 12px; }}
table {{ width: 100%; border-collapse: collapse; background: #ffffff; color: #0f172a; border-radius: 12px; overflow: hidden; }}
th, td {{ padding: 10px 12px; border-bottom: 1px solid #e2e8f0; text-align: left; font-size: 14px; }}
th {{ background: #f1f5f9; font-size: 11px; text-transform: uppercase; color: #64748b; }}
.num {{ text-align: right; font-variant-numeric: tabular-nums; }}
.badge {{ padding: 3px 9px; border-radius: 999px; color: #ffffff; font-weight: 600; font-size: 12px; }}
.level-red .badge {{ background: #dc2626; }}
.level-orange .badge {{ background: #f59e0b; }}
.level-yellow .badge {{ background: #ca8a04; }}
.empty {{ text-align: center; color: #64748b; }}
</style>
</head>
<body>
<div class="page">
  <h1>Seismic Activity Report</h1>
  <p>{date} · last 24 hours · strongest: {strongest}</p>
  <div class="summary">
    <div class="card"><div class="label">Events</div><div class="value">{events}</div></div>
    <div class="card"><div class="label">Max magnitude</div><div class="value">{max_magnitude:.1}</div></div>
    <div class="card"><div class="label">Red</div><div class="value">{red}</div></div>
    <div class="card"><div class="label">Orange</div><div class="value">{orange}</div></div>
    <div class="card"><div class="label">Yellow</div><div class="value">{yellow}</div></div>
    <div class="card"><div class="label">Active anomalies</div><div class="value">{active}</div></div>
  </div>
  <div class="lists">
    <div><h3>Magnitude distribution</h3><ul>{bands}</ul></div>
    <div><h3>Most active regions</h3><ol>{regions}</ol></div>
  </div>
  <h3>Active anomalies</h3>
  <table>
    <thead><tr><th>Location</th><th>Type</th><th>Level</th><th>Score</th><th>Events</th><th>Since</th><th>Details</th></tr></thead>
    <tbody>{rows}</tbody>
  </table>
</div>
</body>
</html>"#,
        date = report.date,
        strongest = strongest,
        events = summary.total_events,
        max_magnitude = summary.max_magnitude,
        red = summary.red,
        orange = summary.orange,
        yellow = summary.yellow,
        active = summary.active_anomalies,
        bands = bands,
        regions = regions,
        rows = rows,
    )
}

async fn send_webhook(url: &str, template: Option<&str>, report: &DailyReport, link: &str) -> Result<()> {
    let summary = &report.summary;
    let payload = template
        .unwrap_or(DEFAULT_REPORT_TEMPLATE)
        .replace("{date}", &report.date)
        .replace("{events}", &summary.total_events.to_string())
        .replace("{max_magnitude}", &format!("{:.1}", summary.max_magnitude))
        .replace("{red}", &summary.red.to_string())
        .replace("{orange}", &summary.orange.to_string())
        .replace("{yellow}", &summary.yellow.to_string())
        .replace("{total}", &summary.total_anomalies().to_string())
        .replace("{link}", link);

    reqwest::Client::new()
        .post(url)
        .header("Content-Type", "application/json")
        .body(payload)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

/// Next local `report_hour:report_minute` strictly after `now`.
pub fn next_report_time<Tz: TimeZone>(config: &RuntimeConfig, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let timezone = now.timezone();
    let mut day = now.date_naive();
    for _ in 0..3 {
        let target = day.and_hms_opt(config.report_hour, config.report_minute, 0)?;
        if let Some(candidate) = timezone.from_local_datetime(&target).earliest() {
            if candidate > now {
                return Some(candidate);
            }
        }
        day = day.succ_opt()?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_domain::{DetectionConfig, EventSource};
    use chrono::FixedOffset;

    fn config() -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            api_token: None,
            report_dir: "./reports".to_string(),
            public_base_url: "http://localhost".to_string(),
            report_webhook_url: None,
            report_webhook_template: None,
            alert_webhook_url: None,
            alert_webhook_template: None,
            alert_min_level: AlertLevel::Yellow,
            max_body_bytes: 1024,
            request_timeout_seconds: 5,
            report_hour: 22,
            report_minute: 0,
            collect_interval_minutes: 15,
            detect_interval_minutes: 30,
            detection: DetectionConfig::default(),
        }
    }

    #[test]
    fn next_report_is_today_or_tomorrow() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let morning = tz.with_ymd_and_hms(2024, 5, 3, 9, 0, 0).unwrap();
        assert_eq!(
            next_report_time(&config(), morning),
            Some(tz.with_ymd_and_hms(2024, 5, 3, 22, 0, 0).unwrap())
        );
        let late = tz.with_ymd_and_hms(2024, 5, 3, 22, 0, 0).unwrap();
        assert_eq!(
            next_report_time(&config(), late),
            Some(tz.with_ymd_and_hms(2024, 5, 4, 22, 0, 0).unwrap())
        );
    }

    #[test]
    fn region_prefers_parenthesised_province() {
        assert_eq!(region_of("SOMA (MANISA)"), "MANISA");
        assert_eq!(region_of("KAVAKCALI-ULA"), "ULA");
        assert_eq!(region_of("AKDENIZ"), "Other");
    }

    #[test]
    fn rendered_report_escapes_labels() {
        let event = SeismicEvent {
            event_id: "usgs_x".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 3, 11, 0, 0).unwrap(),
            latitude: 39.0,
            longitude: 27.0,
            magnitude: 4.2,
            depth_km: 5.0,
            location: "<script> (MANISA)".to_string(),
            source: EventSource::Usgs,
        };
        let report = DailyReport {
            date: "2024-05-03".to_string(),
            summary: ReportSummary {
                total_events: 1,
                max_magnitude: 4.2,
                ..ReportSummary::default()
            },
            strongest: Some(event.clone()),
            magnitude_bands: magnitude_bands(&[event.clone()]),
            top_regions: top_regions(&[event]),
            active: Vec::new(),
        };
        let html = render_report(&report);
        assert!(html.contains("&lt;script&gt; (MANISA)"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("No active anomalies."));
        assert!(html.contains("<li><strong>M4.0-4.9</strong>: 1</li>"));
    }
}
