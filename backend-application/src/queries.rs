// Application queries: read-only views over the stores

pub mod anomaly_queries;
pub mod detection_queries;
pub mod event_queries;
