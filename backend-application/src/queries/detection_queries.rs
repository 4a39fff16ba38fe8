use crate::AppState;
use backend_domain::{CollectionSummary, DetectionRunSummary};

pub async fn last_run(state: &AppState) -> Option<DetectionRunSummary> {
    state.last_run.read().await.clone()
}

pub async fn last_collection(state: &AppState) -> Option<CollectionSummary> {
    state.last_collection.read().await.clone()
}
