// Domain value objects
pub mod alert_level;
pub mod anomaly_type;
pub mod event_source;
pub mod identifiers;

pub use alert_level::*;
pub use anomaly_type::*;
pub use event_source::*;
pub use identifiers::*;
