use std::sync::atomic::{AtomicU64, Ordering};

use backend_domain::DetectionRunSummary;

#[derive(Debug, Default)]
pub struct Metrics {
    ingest_requests: AtomicU64,
    ingest_errors: AtomicU64,
    events_inserted: AtomicU64,
    events_rejected: AtomicU64,
    collector_errors: AtomicU64,
    detection_runs: AtomicU64,
    detection_rejected: AtomicU64,
    anomalies_inserted: AtomicU64,
    anomalies_updated: AtomicU64,
    anomalies_resolved: AtomicU64,
    anomaly_write_failures: AtomicU64,
}

impl Metrics {
    pub fn record_ingest(&self) {
        self.ingest_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingest_error(&self) {
        self.ingest_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_events(&self, inserted: usize, rejected: usize) {
        self.events_inserted
            .fetch_add(inserted as u64, Ordering::Relaxed);
        self.events_rejected
            .fetch_add(rejected as u64, Ordering::Relaxed);
    }

    pub fn record_collector_error(&self) {
        self.collector_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_rejected(&self) {
        self.detection_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failures(&self, count: usize) {
        self.anomaly_write_failures
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_resolved(&self, count: usize) {
        self.anomalies_resolved
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_run(&self, summary: &DetectionRunSummary) {
        self.detection_runs.fetch_add(1, Ordering::Relaxed);
        self.anomalies_inserted
            .fetch_add(summary.inserted() as u64, Ordering::Relaxed);
        self.anomalies_updated
            .fetch_add(summary.updated() as u64, Ordering::Relaxed);
        self.record_resolved(summary.resolved.len());
        self.record_write_failures(summary.failed_writes);
    }

    pub fn render_prometheus(&self) -> String {
        let counters = [
            ("faultline_ingest_requests_total", &self.ingest_requests),
            ("faultline_ingest_errors_total", &self.ingest_errors),
            ("faultline_events_inserted_total", &self.events_inserted),
            ("faultline_events_rejected_total", &self.events_rejected),
            ("faultline_collector_errors_total", &self.collector_errors),
            ("faultline_detection_runs_total", &self.detection_runs),
            ("faultline_detection_rejected_total", &self.detection_rejected),
            ("faultline_anomalies_inserted_total", &self.anomalies_inserted),
            ("faultline_anomalies_updated_total", &self.anomalies_updated),
            ("faultline_anomalies_resolved_total", &self.anomalies_resolved),
            ("faultline_anomaly_write_failures_total", &self.anomaly_write_failures),
        ];

        let mut out = String::new();
        for (name, counter) in counters {
            out.push_str(&format!(
                "# TYPE {} counter\n{} {}\n",
                name,
                name,
                counter.load(Ordering::Relaxed)
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counters_in_prometheus_text_format() {
        let metrics = Metrics::default();
        metrics.record_ingest();
        metrics.record_events(3, 1);
        metrics.record_write_failures(2);

        let text = metrics.render_prometheus();
        assert!(text.contains("# TYPE faultline_events_inserted_total counter\n"));
        assert!(text.contains("faultline_events_inserted_total 3\n"));
        assert!(text.contains("faultline_events_rejected_total 1\n"));
        assert!(text.contains("faultline_anomaly_write_failures_total 2\n"));
        assert!(text.contains("faultline_detection_runs_total 0\n"));
    }
}
