use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("not logged in")]
    Unauthenticated,
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("listing lookup failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("listing lookup returned status {0}")]
    Status(u16),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
