// Domain errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("insufficient data: {observed} events, at least {required} required")]
    InsufficientData { observed: usize, required: usize },
}
