use crate::dirty::DirtySender;
use memecoin_core::cache::Result;
use memecoin_core::{MemeCoinId, ScoreCache};
use std::sync::Arc;
use tracing::trace;

/// Typed access to the cached popularity counters.
///
/// Every successful increment is followed by a dirty signal for the sync
/// scheduler. Signalling never blocks and its failure is not an error.
#[derive(Debug)]
pub struct ScoreAccessor<C> {
    cache: Arc<C>,
    signals: DirtySender,
}

impl<C> Clone for ScoreAccessor<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            signals: self.signals.clone(),
        }
    }
}

impl<C: ScoreCache> ScoreAccessor<C> {
    pub fn new(cache: Arc<C>, signals: DirtySender) -> Self {
        Self { cache, signals }
    }

    /// Atomically adds one to the counter of `id` and marks it dirty.
    ///
    /// Returns the new cached value.
    pub async fn increment(&self, id: MemeCoinId) -> Result<i64> {
        let score = self.cache.incr(id).await?;
        if !self.signals.mark(id) {
            trace!(id = %id, "Dirty signal dropped; id resyncs on its next increment");
        }
        Ok(score)
    }

    /// Adds one to the counter of `id` only if it exists, and marks it dirty.
    ///
    /// Returns `Ok(None)` when there is no counter. Nothing is created or
    /// signalled in that case.
    pub async fn increment_existing(&self, id: MemeCoinId) -> Result<Option<i64>> {
        let Some(score) = self.cache.incr_existing(id).await? else {
            return Ok(None);
        };
        if !self.signals.mark(id) {
            trace!(id = %id, "Dirty signal dropped; id resyncs on its next increment");
        }
        Ok(Some(score))
    }

    /// Reads the cached counter of `id`.
    pub async fn current(&self, id: MemeCoinId) -> Result<Option<i64>> {
        self.cache.get_score(id).await
    }

    /// Sets the cached counter of `id` without marking it dirty.
    pub async fn seed(&self, id: MemeCoinId, score: i64) -> Result<()> {
        self.cache.set_score(id, score).await
    }

    /// Deletes the cached counter of `id` and drops it from the pending set.
    ///
    /// Deleting an absent counter is not an error.
    pub async fn remove(&self, id: MemeCoinId) -> Result<()> {
        self.cache.del(id).await?;
        self.signals.forget(id);
        Ok(())
    }

    pub async fn exists(&self, id: MemeCoinId) -> Result<bool> {
        self.cache.exists(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirty::{dirty_channel, DirtySignal};
    use crate::testing::FlakyCache;
    use memecoin_core::CacheError;

    fn id(value: i64) -> MemeCoinId {
        MemeCoinId::new(value)
    }

    #[tokio::test]
    async fn increment_updates_cache_and_marks_dirty() {
        let cache = Arc::new(FlakyCache::new());
        let (signals, mut receiver) = dirty_channel(8);
        let accessor = ScoreAccessor::new(Arc::clone(&cache), signals);

        assert_eq!(accessor.increment(id(1)).await.unwrap(), 1);
        assert_eq!(accessor.increment(id(1)).await.unwrap(), 2);

        assert_eq!(accessor.current(id(1)).await.unwrap(), Some(2));
        assert_eq!(receiver.try_recv(), Some(DirtySignal::Marked(id(1))));
        assert_eq!(receiver.try_recv(), Some(DirtySignal::Marked(id(1))));
        assert_eq!(receiver.try_recv(), None);
    }

    #[tokio::test]
    async fn increment_succeeds_when_signal_is_dropped() {
        let cache = Arc::new(FlakyCache::new());
        let (signals, _receiver) = dirty_channel(1);
        let accessor = ScoreAccessor::new(cache, signals);

        accessor.increment(id(1)).await.unwrap();
        // The queue is full now; the count must still land in the cache.
        assert_eq!(accessor.increment(id(1)).await.unwrap(), 2);
        assert_eq!(accessor.current(id(1)).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn cache_failure_is_surfaced_and_nothing_is_signalled() {
        let cache = Arc::new(FlakyCache::new());
        cache.set_unavailable(true);
        let (signals, mut receiver) = dirty_channel(8);
        let accessor = ScoreAccessor::new(cache, signals);

        let err = accessor.increment(id(1)).await.unwrap_err();
        assert!(matches!(err, CacheError::Unavailable(_)));
        assert_eq!(receiver.try_recv(), None);
    }

    #[tokio::test]
    async fn remove_is_idempotent_and_forgets_the_id() {
        let cache = Arc::new(FlakyCache::new());
        let (signals, mut receiver) = dirty_channel(8);
        let accessor = ScoreAccessor::new(cache, signals);

        accessor.seed(id(4), 10).await.unwrap();
        accessor.remove(id(4)).await.unwrap();
        accessor.remove(id(4)).await.unwrap();

        assert!(!accessor.exists(id(4)).await.unwrap());
        assert_eq!(receiver.try_recv(), Some(DirtySignal::Forgotten(id(4))));
        assert_eq!(receiver.try_recv(), Some(DirtySignal::Forgotten(id(4))));
    }

    #[tokio::test]
    async fn increment_existing_ignores_missing_counter() {
        let cache = Arc::new(FlakyCache::new());
        let (signals, mut receiver) = dirty_channel(8);
        let accessor = ScoreAccessor::new(cache, signals);

        assert_eq!(accessor.increment_existing(id(3)).await.unwrap(), None);
        assert!(!accessor.exists(id(3)).await.unwrap());
        assert_eq!(receiver.try_recv(), None);

        accessor.seed(id(3), 4).await.unwrap();
        assert_eq!(accessor.increment_existing(id(3)).await.unwrap(), Some(5));
        assert_eq!(receiver.try_recv(), Some(DirtySignal::Marked(id(3))));
    }

    #[tokio::test]
    async fn seed_does_not_mark_dirty() {
        let cache = Arc::new(FlakyCache::new());
        let (signals, mut receiver) = dirty_channel(8);
        let accessor = ScoreAccessor::new(cache, signals);

        accessor.seed(id(2), 7).await.unwrap();

        assert_eq!(accessor.current(id(2)).await.unwrap(), Some(7));
        assert_eq!(receiver.try_recv(), None);
    }
}
