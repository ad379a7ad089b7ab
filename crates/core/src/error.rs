use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid time window: {0}")]
    InvalidTimeWindow(String),
    #[error("invalid video id: {0}")]
    InvalidVideoId(String),
}
