use std::sync::Arc;

use backend_domain::ports::{AlertService, AnomalyRepository, EventCollector, EventRepository};
use backend_domain::services::SeismicAnalyzer;
use backend_domain::{CollectionSummary, DetectionRunSummary, RuntimeConfig};
use tokio::sync::{Mutex, RwLock};

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub event_repo: Arc<dyn EventRepository>,
    pub anomaly_repo: Arc<dyn AnomalyRepository>,
    pub alert_service: Arc<dyn AlertService>,
    pub collectors: Arc<Vec<Arc<dyn EventCollector>>>,
    pub analyzer: Arc<SeismicAnalyzer>,
    pub metrics: Arc<Metrics>,
    /// Held for the whole of a detection run.
    pub run_lock: Arc<Mutex<()>>,
    pub last_run: Arc<RwLock<Option<DetectionRunSummary>>>,
    pub last_collection: Arc<RwLock<Option<CollectionSummary>>>,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        event_repo: Arc<dyn EventRepository>,
        anomaly_repo: Arc<dyn AnomalyRepository>,
        alert_service: Arc<dyn AlertService>,
        collectors: Vec<Arc<dyn EventCollector>>,
    ) -> Self {
        let analyzer = SeismicAnalyzer::new(config.detection.clone());
        Self {
            config,
            event_repo,
            anomaly_repo,
            alert_service,
            collectors: Arc::new(collectors),
            analyzer: Arc::new(analyzer),
            metrics: Arc::new(Metrics::default()),
            run_lock: Arc::new(Mutex::new(())),
            last_run: Arc::new(RwLock::new(None)),
            last_collection: Arc::new(RwLock::new(None)),
        }
    }
}
