use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("a detection run is already in progress")]
    RunInProgress,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
