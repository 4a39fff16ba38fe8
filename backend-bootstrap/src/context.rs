use std::sync::Arc;

use anyhow::Result;
use clickhouse::Client;
use tracing::{info, warn};

use backend_application::AppState;
use backend_domain::ports::{AlertService, AnomalyRepository, EventRepository, HealthCheckService};
use backend_domain::DbConfig;
use backend_infrastructure::{
    build_collectors, AppConfig, ClickhouseRepo, MemoryRepository, StoreHealthService,
    WebhookAlertService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Clickhouse,
    /// Nothing survives a restart.
    Memory,
}

pub struct AppContext {
    pub state: AppState,
    pub health: Arc<dyn HealthCheckService>,
}

impl AppContext {
    pub async fn new(config: &AppConfig, backend: StoreBackend) -> Result<Self> {
        let runtime_config = config.to_runtime_config();

        let (event_repo, anomaly_repo): (Arc<dyn EventRepository>, Arc<dyn AnomalyRepository>) =
            match backend {
                StoreBackend::Clickhouse => {
                    let db_config = config.to_db_config();
                    let repo = Arc::new(ClickhouseRepo::new(
                        clickhouse_client(&db_config),
                        db_config.clickhouse_database.clone(),
                    ));
                    repo.ensure_schema().await?;
                    info!(url = %db_config.clickhouse_url, database = %db_config.clickhouse_database, "clickhouse store ready");
                    (repo.clone(), repo)
                }
                StoreBackend::Memory => {
                    warn!("using in-memory store, data is lost on exit");
                    let repo = Arc::new(MemoryRepository::new());
                    (repo.clone(), repo)
                }
            };

        let alert_service: Arc<dyn AlertService> = Arc::new(WebhookAlertService::new());
        let collectors = build_collectors(config)?;
        info!(
            sources = ?collectors.iter().map(|c| c.source()).collect::<Vec<_>>(),
            "collectors configured"
        );

        let health = Arc::new(StoreHealthService::new(
            event_repo.clone(),
            alert_service.clone(),
            runtime_config.clone(),
        ));
        let state = AppState::new(
            runtime_config,
            event_repo,
            anomaly_repo,
            alert_service,
            collectors,
        );

        Ok(Self { state, health })
    }
}

fn clickhouse_client(db_config: &DbConfig) -> Client {
    let mut client = Client::default()
        .with_url(&db_config.clickhouse_url)
        .with_database(&db_config.clickhouse_database);
    if let Some(user) = &db_config.clickhouse_user {
        client = client.with_user(user);
    }
    if let Some(password) = &db_config.clickhouse_password {
        client = client.with_password(password);
    }
    client
}
