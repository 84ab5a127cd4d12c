use thiserror::Error;

/// Errors surfaced by a [`ScoreCache`](crate::ScoreCache) backend.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("score cache unavailable: {0}")]
    Unavailable(String),
    #[error("score cache timed out: {0}")]
    Timeout(String),
    /// A counter exists but does not hold an integer.
    #[error("corrupt cached counter: {0}")]
    InvalidData(String),
    #[error("score cache command failed: {0}")]
    Operation(String),
}

/// Errors surfaced by a [`ScoreStore`](crate::ScoreStore) backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("score store unavailable: {0}")]
    Unavailable(String),
    #[error("score store timed out: {0}")]
    Timeout(String),
    #[error("score query failed: {0}")]
    Query(String),
    #[error("persisted score row is invalid: {0}")]
    InvalidData(String),
    #[error("score store operation failed: {0}")]
    Operation(String),
}
