// Run summaries for detection and collection passes

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::AnomalyRecord;
use crate::value_objects::EventSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodStatus {
    Completed { candidates: usize },
    InsufficientData { observed: usize, required: usize },
    Failed { reason: String },
}

impl MethodStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, MethodStatus::Completed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciledAnomaly {
    pub outcome: ReconcileOutcome,
    pub record: AnomalyRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionRunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub recent_events: usize,
    pub baseline_events: usize,
    pub frequency: MethodStatus,
    pub escalation: MethodStatus,
    /// Records inserted or updated by this run, in candidate order.
    pub qualifying: Vec<ReconciledAnomaly>,
    pub resolved: Vec<AnomalyRecord>,
    pub failed_writes: usize,
}

impl DetectionRunSummary {
    pub fn inserted(&self) -> usize {
        self.count_outcome(ReconcileOutcome::Inserted)
    }

    pub fn updated(&self) -> usize {
        self.count_outcome(ReconcileOutcome::Updated)
    }

    pub fn qualifying_records(&self) -> Vec<AnomalyRecord> {
        self.qualifying.iter().map(|item| item.record.clone()).collect()
    }

    fn count_outcome(&self, outcome: ReconcileOutcome) -> usize {
        self.qualifying
            .iter()
            .filter(|item| item.outcome == outcome)
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceCollection {
    pub source: EventSource,
    pub fetched: usize,
    pub inserted: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceCollection>,
}

impl CollectionSummary {
    pub fn inserted(&self) -> usize {
        self.sources.iter().map(|source| source.inserted).sum()
    }
}
