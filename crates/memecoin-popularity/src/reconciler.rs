use crate::error::SyncError;
use jiff::Timestamp;
use memecoin_core::{MemeCoinId, ScoreCache, ScoreRow, ScoreStore, ScoreTransaction};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Counters persisted by the pass, with the value written.
    pub applied: Vec<ScoreRow>,
    /// Ids without a readable cached counter. Nothing was written for them.
    pub skipped: Vec<MemeCoinId>,
    /// Ids whose update was rejected by the store or matched no row.
    pub failed: Vec<MemeCoinId>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Copies cached counters into the store, one transaction per batch.
///
/// The cached value is authoritative: whatever the cache holds at read time
/// overwrites the persisted score.
pub struct BatchReconciler<C, S> {
    cache: Arc<C>,
    store: Arc<S>,
}

impl<C, S> BatchReconciler<C, S>
where
    C: ScoreCache,
    S: ScoreStore,
{
    pub fn new(cache: Arc<C>, store: Arc<S>) -> Self {
        Self { cache, store }
    }

    /// Reconciles every id in `ids` inside a single transaction.
    ///
    /// Per-id problems are recorded in the report and do not abort the pass.
    /// Failing to open or commit the transaction does, and then none of the
    /// ids were persisted.
    pub async fn reconcile(&self, ids: &HashSet<MemeCoinId>) -> Result<ReconcileReport, SyncError> {
        let mut report = ReconcileReport::default();
        if ids.is_empty() {
            return Ok(report);
        }

        let started = Timestamp::now();
        let mut tx = self.store.begin().await.map_err(|e| {
            error!(batch_size = ids.len(), error = %e, "Failed to begin reconciliation");
            SyncError::Begin(e)
        })?;

        let mut batch: Vec<MemeCoinId> = ids.iter().copied().collect();
        batch.sort_unstable();

        for id in batch {
            let score = match self.cache.get_score(id).await {
                Ok(Some(score)) => score,
                Ok(None) => {
                    debug!(id = %id, "No cached counter, skipping");
                    report.skipped.push(id);
                    continue;
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to read cached counter, skipping");
                    report.skipped.push(id);
                    continue;
                }
            };

            match tx.update_score(id, score).await {
                Ok(true) => report.applied.push(ScoreRow {
                    id,
                    popularity_score: score,
                }),
                Ok(false) => {
                    warn!(id = %id, score, "No persisted row for cached counter");
                    report.failed.push(id);
                }
                Err(e) => {
                    warn!(id = %id, score, error = %e, "Failed to stage score update");
                    report.failed.push(id);
                }
            }
        }

        if report.applied.is_empty() {
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "Failed to roll back empty reconciliation");
            }
        } else if let Err(e) = tx.commit().await {
            error!(
                batch_size = ids.len(),
                staged = report.applied.len(),
                error = %e,
                "Failed to commit reconciliation"
            );
            return Err(SyncError::Commit(e));
        }

        let elapsed = Timestamp::now().duration_since(started);
        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            elapsed = %elapsed,
            "Reconciled popularity scores"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FlakyCache, RecordingStore};

    fn id(value: i64) -> MemeCoinId {
        MemeCoinId::new(value)
    }

    fn ids(values: &[i64]) -> HashSet<MemeCoinId> {
        values.iter().copied().map(MemeCoinId::new).collect()
    }

    fn reconciler(
        cache: &Arc<FlakyCache>,
        store: &RecordingStore,
    ) -> BatchReconciler<FlakyCache, RecordingStore> {
        BatchReconciler::new(Arc::clone(cache), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn cached_value_overwrites_persisted_score() {
        let cache = Arc::new(FlakyCache::new());
        let store = RecordingStore::with_rows([ScoreRow::new(42, 0)]);
        for _ in 0..5 {
            cache.incr(id(42)).await.unwrap();
        }

        let report = reconciler(&cache, &store)
            .reconcile(&ids(&[42]))
            .await
            .unwrap();

        assert_eq!(report.applied, vec![ScoreRow::new(42, 5)]);
        assert_eq!(store.score(id(42)).await, Some(5));
        assert_eq!(store.commits(), vec![vec![id(42)]]);
    }

    #[tokio::test]
    async fn missing_row_fails_alone() {
        let cache = Arc::new(FlakyCache::new());
        let store = RecordingStore::with_rows([ScoreRow::new(1, 0), ScoreRow::new(3, 0)]);
        for value in [1, 2, 3] {
            cache.set_score(id(value), 10 * value).await.unwrap();
        }

        let report = reconciler(&cache, &store)
            .reconcile(&ids(&[1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(report.applied, vec![ScoreRow::new(1, 10), ScoreRow::new(3, 30)]);
        assert_eq!(report.failed, vec![id(2)]);
        assert_eq!(store.score(id(1)).await, Some(10));
        assert_eq!(store.score(id(3)).await, Some(30));
        assert_eq!(store.score(id(2)).await, None);
    }

    #[tokio::test]
    async fn rejected_update_does_not_abort_the_pass() {
        let cache = Arc::new(FlakyCache::new());
        let store = RecordingStore::with_rows([ScoreRow::new(1, 0), ScoreRow::new(2, 0)]);
        cache.set_score(id(1), 4).await.unwrap();
        cache.set_score(id(2), 9).await.unwrap();
        store.fail_update(id(1));

        let report = reconciler(&cache, &store)
            .reconcile(&ids(&[1, 2]))
            .await
            .unwrap();

        assert_eq!(report.failed, vec![id(1)]);
        assert_eq!(report.applied, vec![ScoreRow::new(2, 9)]);
        assert_eq!(store.score(id(1)).await, Some(0));
        assert_eq!(store.score(id(2)).await, Some(9));
    }

    #[tokio::test]
    async fn absent_counter_is_skipped() {
        let cache = Arc::new(FlakyCache::new());
        let store = RecordingStore::with_rows([ScoreRow::new(7, 3)]);

        let report = reconciler(&cache, &store)
            .reconcile(&ids(&[7]))
            .await
            .unwrap();

        assert_eq!(report.skipped, vec![id(7)]);
        assert_eq!(store.score(id(7)).await, Some(3));
        // Nothing staged, so nothing was committed.
        assert!(store.commits().is_empty());
        assert_eq!(store.rollbacks(), 1);
    }

    #[tokio::test]
    async fn unreadable_counters_are_skipped() {
        let cache = Arc::new(FlakyCache::new());
        let store = RecordingStore::with_rows([ScoreRow::new(1, 0)]);
        cache.set_score(id(1), 2).await.unwrap();
        cache.set_reads_fail(true);

        let report = reconciler(&cache, &store)
            .reconcile(&ids(&[1]))
            .await
            .unwrap();

        assert_eq!(report.skipped, vec![id(1)]);
        assert_eq!(store.score(id(1)).await, Some(0));
    }

    #[tokio::test]
    async fn empty_batch_opens_no_transaction() {
        let cache = Arc::new(FlakyCache::new());
        let store = RecordingStore::default();

        let report = reconciler(&cache, &store)
            .reconcile(&HashSet::new())
            .await
            .unwrap();

        assert!(report.is_empty());
        assert_eq!(store.begins(), 0);
    }

    #[tokio::test]
    async fn begin_failure_is_a_transaction_error() {
        let cache = Arc::new(FlakyCache::new());
        let store = RecordingStore::with_rows([ScoreRow::new(1, 0)]);
        cache.set_score(id(1), 1).await.unwrap();
        store.fail_begin(true);

        let err = reconciler(&cache, &store)
            .reconcile(&ids(&[1]))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Begin(_)));
        assert_eq!(store.score(id(1)).await, Some(0));
    }

    #[tokio::test]
    async fn commit_failure_persists_nothing() {
        let cache = Arc::new(FlakyCache::new());
        let store = RecordingStore::with_rows([ScoreRow::new(1, 0), ScoreRow::new(2, 0)]);
        cache.set_score(id(1), 5).await.unwrap();
        cache.set_score(id(2), 6).await.unwrap();
        store.fail_next_commits(1);

        let err = reconciler(&cache, &store)
            .reconcile(&ids(&[1, 2]))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Commit(_)));
        assert_eq!(store.score(id(1)).await, Some(0));
        assert_eq!(store.score(id(2)).await, Some(0));
        assert!(store.commits().is_empty());
    }
}
