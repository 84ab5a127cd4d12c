use crate::accessor::ScoreAccessor;
use crate::error::PopularityError;
use memecoin_core::{MemeCoinId, ScoreCache};
use tracing::debug;

/// Entry point used by request handlers.
///
/// Increments only succeed for ids the cache already knows about, either
/// from warm-up or from [`track`](PopularityService::track). The existence
/// check and the increment are one atomic cache operation, so an increment
/// racing a removal never recreates the counter.
#[derive(Debug)]
pub struct PopularityService<C> {
    accessor: ScoreAccessor<C>,
}

impl<C> Clone for PopularityService<C> {
    fn clone(&self) -> Self {
        Self {
            accessor: self.accessor.clone(),
        }
    }
}

impl<C: ScoreCache> PopularityService<C> {
    pub fn new(accessor: ScoreAccessor<C>) -> Self {
        Self { accessor }
    }

    /// Adds one to the popularity score of `id` and returns the new score.
    ///
    /// The change reaches the store on a later reconciliation pass.
    pub async fn increment_popularity(&self, id: MemeCoinId) -> Result<i64, PopularityError> {
        let Some(score) = self.accessor.increment_existing(id).await? else {
            return Err(PopularityError::UnknownMemeCoin(id));
        };
        debug!(id = %id, score, "Incremented popularity score");
        Ok(score)
    }

    /// Current cached score of `id`, if it has one.
    pub async fn popularity_score(&self, id: MemeCoinId) -> Result<Option<i64>, PopularityError> {
        Ok(self.accessor.current(id).await?)
    }

    /// Starts tracking a newly created MemeCoin.
    pub async fn track(&self, id: MemeCoinId, initial_score: i64) -> Result<(), PopularityError> {
        self.accessor.seed(id, initial_score).await?;
        Ok(())
    }

    /// Drops the cached score of a deleted MemeCoin.
    ///
    /// Removing an untracked id is not an error.
    pub async fn remove_popularity_score(&self, id: MemeCoinId) -> Result<(), PopularityError> {
        self.accessor.remove(id).await?;
        debug!(id = %id, "Removed popularity score");
        Ok(())
    }
}
