pub mod anomaly_handlers;
pub mod detect_handlers;
pub mod event_handlers;
pub mod ingest_handlers;
pub mod ops_handlers;

pub use anomaly_handlers::*;
pub use detect_handlers::*;
pub use event_handlers::*;
pub use ingest_handlers::*;
pub use ops_handlers::*;
