use crate::error::StorageError;
use crate::score::{MemeCoinId, ScoreRow};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, StorageError>;

/// The relational store holding the persisted popularity counters.
///
/// Only the score column is visible through this contract; the remaining
/// columns of a MemeCoin row belong to the CRUD layer.
#[async_trait]
pub trait ScoreStore: Send + Sync + 'static {
    type Transaction: ScoreTransaction;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Returns up to `limit` rows with an id strictly greater than `after`,
    /// ordered by id ascending. `None` starts from the first row.
    async fn fetch_scores(&self, after: Option<MemeCoinId>, limit: usize) -> Result<Vec<ScoreRow>>;
}

/// An open transaction against a [`ScoreStore`].
#[async_trait]
pub trait ScoreTransaction: Send + 'static {
    /// Stages an update of the persisted counter.
    ///
    /// Returns `Ok(false)` when no row exists for `id`. A failed update does
    /// not invalidate updates already staged for other ids.
    async fn update_score(&mut self, id: MemeCoinId, score: i64) -> Result<bool>;

    /// Commits every staged update.
    ///
    /// On error nothing staged in this transaction is applied.
    async fn commit(self) -> Result<()>;

    /// Discards every staged update.
    async fn rollback(self) -> Result<()>;
}
