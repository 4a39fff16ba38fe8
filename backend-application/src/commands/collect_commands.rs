use chrono::Utc;
use tracing::{info, warn};

use crate::dtos::IngestResult;
use crate::{AppError, AppState};
use backend_domain::{CollectionSummary, IngestEnvelope, SeismicEvent, SourceCollection};

const SUPPORTED_SCHEMA_VERSION: &str = "v1";

/// Polls every configured collector in turn. A failing source is recorded in
/// the summary and the remaining sources still run.
pub async fn collect_all(state: &AppState) -> CollectionSummary {
    let started_at = Utc::now();
    let mut sources = Vec::with_capacity(state.collectors.len());

    for collector in state.collectors.iter() {
        let source = collector.source();
        let fetched = match collector.fetch_recent().await {
            Ok(events) => events,
            Err(err) => {
                warn!(source = %source, error = %err, "collector failed");
                state.metrics.record_collector_error();
                sources.push(SourceCollection {
                    source,
                    fetched: 0,
                    inserted: 0,
                    skipped: 0,
                    error: Some(err.to_string()),
                });
                continue;
            }
        };

        let fetched_count = fetched.len();
        let (valid, rejected) = partition_valid(fetched);
        match state.event_repo.insert_events(&valid).await {
            Ok(inserted) => {
                state.metrics.record_events(inserted, rejected);
                info!(
                    source = %source,
                    fetched = fetched_count,
                    inserted,
                    rejected,
                    "collected events"
                );
                sources.push(SourceCollection {
                    source,
                    fetched: fetched_count,
                    inserted,
                    skipped: fetched_count - inserted,
                    error: None,
                });
            }
            Err(err) => {
                warn!(source = %source, error = %err, "failed to store collected events");
                state.metrics.record_collector_error();
                sources.push(SourceCollection {
                    source,
                    fetched: fetched_count,
                    inserted: 0,
                    skipped: fetched_count,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    let summary = CollectionSummary {
        started_at,
        finished_at: Utc::now(),
        sources,
    };
    *state.last_collection.write().await = Some(summary.clone());
    summary
}

pub async fn ingest_events(
    state: &AppState,
    envelope: IngestEnvelope,
) -> Result<IngestResult, AppError> {
    if envelope.schema_version != SUPPORTED_SCHEMA_VERSION {
        state.metrics.record_ingest_error();
        return Err(AppError::BadRequest(format!(
            "unsupported schema_version '{}'",
            envelope.schema_version
        )));
    }

    let received = envelope.events.len();
    let (valid, rejected) = partition_valid(envelope.events);
    let inserted = state.event_repo.insert_events(&valid).await.map_err(|err| {
        state.metrics.record_ingest_error();
        AppError::Internal(err)
    })?;

    state.metrics.record_ingest();
    state.metrics.record_events(inserted, rejected);
    Ok(IngestResult {
        received,
        inserted,
        rejected,
    })
}

/// Splits off invalid events, returning the valid ones and how many were
/// dropped.
fn partition_valid(events: Vec<SeismicEvent>) -> (Vec<SeismicEvent>, usize) {
    let mut rejected = 0;
    let valid = events
        .into_iter()
        .filter(|event| {
            if event.is_valid() {
                true
            } else {
                warn!(event_id = %event.event_id, source = %event.source, "dropping invalid event");
                rejected += 1;
                false
            }
        })
        .collect();
    (valid, rejected)
}
