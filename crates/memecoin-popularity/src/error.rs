use crate::config::ConfigError;
use memecoin_core::{CacheError, MemeCoinId, StorageError};
use thiserror::Error;

/// Errors returned to callers of the popularity service and the startup sequence.
#[derive(Debug, Clone, Error)]
pub enum PopularityError {
    #[error("no such meme coin: {0}")]
    UnknownMemeCoin(MemeCoinId),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("warm-up failed: {0}")]
    WarmUp(#[from] WarmUpError),
}

/// Transaction-level failure of a reconciliation pass.
///
/// None of the ids in the pass were persisted.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("failed to begin reconciliation transaction: {0}")]
    Begin(StorageError),
    #[error("failed to commit reconciliation transaction: {0}")]
    Commit(StorageError),
}

#[derive(Debug, Clone, Error)]
pub enum WarmUpError {
    #[error("failed to read scores after id {after:?}: {source}")]
    Fetch {
        after: Option<MemeCoinId>,
        source: StorageError,
    },
    #[error("failed to seed {count} counters: {source}")]
    Seed { count: usize, source: CacheError },
}
