use async_trait::async_trait;

use crate::entities::{AnomalyRecord, SeismicEvent, TimeRange};

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    /// Stores events whose `event_id` is not yet known and returns how many
    /// were new.
    async fn insert_events(&self, events: &[SeismicEvent]) -> anyhow::Result<usize>;
    /// Events with `range.start <= timestamp <= range.end`.
    async fn query_events(&self, range: TimeRange) -> anyhow::Result<Vec<SeismicEvent>>;
    async fn fetch_event(&self, event_id: &str) -> anyhow::Result<Option<SeismicEvent>>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AnomalyRepository: Send + Sync {
    async fn find_active_anomaly(&self, location: &str) -> anyhow::Result<Option<AnomalyRecord>>;
    /// Inserts or replaces one record keyed by its id. Each call is an
    /// independent atomic write. Implementations reject a second active
    /// record for a location that already has one.
    async fn upsert_anomaly(&self, record: &AnomalyRecord) -> anyhow::Result<()>;
    async fn fetch_anomaly(&self, id: &str) -> anyhow::Result<Option<AnomalyRecord>>;
    async fn query_active_anomalies(&self) -> anyhow::Result<Vec<AnomalyRecord>>;
    /// Records whose `detected_at` falls inside the range, active or not.
    async fn fetch_anomalies_between(&self, range: TimeRange) -> anyhow::Result<Vec<AnomalyRecord>>;
}
