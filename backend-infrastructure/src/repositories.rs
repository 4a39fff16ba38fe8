pub mod clickhouse_repo;
pub mod memory;

pub use clickhouse_repo::*;
pub use memory::*;
