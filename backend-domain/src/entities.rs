// Domain entities

pub mod anomaly;
pub mod config;
pub mod event;
pub mod grid;
pub mod report;
pub mod run;

pub use anomaly::*;
pub use config::*;
pub use event::*;
pub use grid::*;
pub use report::*;
pub use run::*;
