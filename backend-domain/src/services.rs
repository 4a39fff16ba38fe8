// Domain services: the pure anomaly detection pipeline

pub mod analyzer;
pub mod baseline;
pub mod grid_binner;
pub mod location;
pub mod reconciler;
pub mod scorer;

pub use analyzer::*;
pub use baseline::*;
pub use grid_binner::*;
pub use location::*;
pub use reconciler::*;
pub use scorer::*;
