use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use backend_domain::ports::{AnomalyRepository, EventRepository};
use backend_domain::{AnomalyRecord, SeismicEvent, TimeRange};

/// Process-local store used by `--memory` runs and tests.
#[derive(Default)]
pub struct MemoryRepository {
    events: RwLock<BTreeMap<String, SeismicEvent>>,
    anomalies: RwLock<HashMap<String, AnomalyRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all_anomalies(&self) -> Vec<AnomalyRecord> {
        let mut records: Vec<_> = self.anomalies.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.first_detected_at.cmp(&b.first_detected_at).then_with(|| a.id.cmp(&b.id)));
        records
    }
}

#[async_trait]
impl EventRepository for MemoryRepository {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_events(&self, events: &[SeismicEvent]) -> Result<usize> {
        let mut stored = self.events.write().await;
        let mut inserted = 0;
        for event in events {
            if !stored.contains_key(&event.event_id) {
                stored.insert(event.event_id.clone(), event.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn query_events(&self, range: TimeRange) -> Result<Vec<SeismicEvent>> {
        let mut events: Vec<_> = self
            .events
            .read()
            .await
            .values()
            .filter(|event| range.contains(event.timestamp))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }

    async fn fetch_event(&self, event_id: &str) -> Result<Option<SeismicEvent>> {
        Ok(self.events.read().await.get(event_id).cloned())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl AnomalyRepository for MemoryRepository {
    async fn find_active_anomaly(&self, location: &str) -> Result<Option<AnomalyRecord>> {
        Ok(self
            .anomalies
            .read()
            .await
            .values()
            .find(|record| record.is_active && record.location == location)
            .cloned())
    }

    async fn upsert_anomaly(&self, record: &AnomalyRecord) -> Result<()> {
        let mut anomalies = self.anomalies.write().await;
        if record.is_active {
            let conflict = anomalies.values().find(|existing| {
                existing.is_active && existing.location == record.location && existing.id != record.id
            });
            if let Some(existing) = conflict {
                bail!(
                    "location '{}' already has active anomaly {}",
                    record.location,
                    existing.id
                );
            }
        }
        anomalies.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn fetch_anomaly(&self, id: &str) -> Result<Option<AnomalyRecord>> {
        Ok(self.anomalies.read().await.get(id).cloned())
    }

    async fn query_active_anomalies(&self) -> Result<Vec<AnomalyRecord>> {
        Ok(self
            .all_anomalies()
            .await
            .into_iter()
            .filter(|record| record.is_active)
            .collect())
    }

    async fn fetch_anomalies_between(&self, range: TimeRange) -> Result<Vec<AnomalyRecord>> {
        Ok(self
            .all_anomalies()
            .await
            .into_iter()
            .filter(|record| range.contains(record.detected_at))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_domain::{AlertLevel, AnomalyType, EventSource};
    use chrono::{Duration, TimeZone, Utc};

    fn event(id: &str, hours_ago: i64) -> SeismicEvent {
        let now = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        SeismicEvent {
            event_id: id.to_string(),
            timestamp: now - Duration::hours(hours_ago),
            latitude: 38.0,
            longitude: 27.0,
            magnitude: 3.0,
            depth_km: 5.0,
            location: "EGE DENIZI".to_string(),
            source: EventSource::Kandilli,
        }
    }

    fn record(id: &str, location: &str, is_active: bool) -> AnomalyRecord {
        let now = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        AnomalyRecord {
            id: id.to_string(),
            location: location.to_string(),
            center_lat: 38.0,
            center_lon: 27.0,
            radius_km: 50.0,
            score: 4.0,
            event_count: 7,
            baseline_rate: Some(1.0),
            current_rate: Some(7.0),
            alert_level: AlertLevel::Orange,
            anomaly_type: AnomalyType::Frequency,
            description: String::new(),
            is_active,
            first_detected_at: now,
            detected_at: now,
            resolved_at: None,
            revision: 0,
        }
    }

    #[tokio::test]
    async fn insert_events_deduplicates_by_id() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.insert_events(&[event("a", 1), event("b", 2)]).await.unwrap(), 2);
        assert_eq!(repo.insert_events(&[event("a", 1), event("c", 3)]).await.unwrap(), 1);

        let end = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        let events = repo
            .query_events(TimeRange::new(end - Duration::hours(2), end))
            .await
            .unwrap();
        let ids: Vec<_> = events.iter().map(|event| event.event_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn rejects_second_active_record_for_location() {
        let repo = MemoryRepository::new();
        repo.upsert_anomaly(&record("one", "SOMA", true)).await.unwrap();
        assert!(repo.upsert_anomaly(&record("two", "SOMA", true)).await.is_err());

        repo.upsert_anomaly(&record("one", "SOMA", false)).await.unwrap();
        repo.upsert_anomaly(&record("two", "SOMA", true)).await.unwrap();
        assert_eq!(repo.query_active_anomalies().await.unwrap().len(), 1);
        assert_eq!(
            repo.find_active_anomaly("SOMA").await.unwrap().map(|record| record.id),
            Some("two".to_string())
        );
    }
}
