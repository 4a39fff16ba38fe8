// Response bodies produced by commands

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    pub received: usize,
    pub inserted: usize,
    pub rejected: usize,
}
