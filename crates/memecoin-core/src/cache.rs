use crate::error::CacheError;
use crate::score::{MemeCoinId, ScoreRow};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, CacheError>;

/// A key-value cache holding one integer popularity counter per MemeCoin.
///
/// Implementations are shared by arbitrarily many concurrent callers and
/// must provide atomicity for [`incr`](ScoreCache::incr) themselves.
#[async_trait]
pub trait ScoreCache: Send + Sync + 'static {
    /// Atomically adds one to the counter, creating it at zero first if absent.
    ///
    /// Returns the counter value after the increment.
    async fn incr(&self, id: MemeCoinId) -> Result<i64>;

    /// Reads the counter.
    ///
    /// Returns `Ok(None)` if no counter exists for `id`.
    async fn get_score(&self, id: MemeCoinId) -> Result<Option<i64>>;

    /// Overwrites the counter.
    async fn set_score(&self, id: MemeCoinId, score: i64) -> Result<()>;

    /// Atomically adds one to an existing counter.
    ///
    /// Returns `Ok(None)` without creating anything if no counter exists for
    /// `id`, so a counter removed concurrently is never recreated.
    async fn incr_existing(&self, id: MemeCoinId) -> Result<Option<i64>>;

    /// Creates the counters in `rows` that do not exist yet, in one pipelined
    /// write. Existing counters keep their value.
    ///
    /// Returns the number of counters created.
    async fn seed_scores(&self, rows: &[ScoreRow]) -> Result<usize>;

    /// Removes the counter.
    ///
    /// It is not an error if the counter does not exist.
    async fn del(&self, id: MemeCoinId) -> Result<()>;

    /// Reports whether a counter exists for `id`.
    async fn exists(&self, id: MemeCoinId) -> Result<bool>;
}
