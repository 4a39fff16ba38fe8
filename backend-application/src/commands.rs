// Application commands: operations that change stored state

pub mod anomaly_commands;
pub mod collect_commands;
pub mod detection_commands;
