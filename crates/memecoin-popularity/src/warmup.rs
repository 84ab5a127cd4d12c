use crate::error::WarmUpError;
use memecoin_core::{MemeCoinId, ScoreCache, ScoreStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Totals of a completed warm-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmUpReport {
    /// Pages read from the store, including a final empty one.
    pub pages: usize,
    /// Counters created in the cache.
    pub seeded: usize,
    /// Rows skipped because the cache already held a counter for them.
    pub kept: usize,
}

/// Seeds the cache with every persisted counter before traffic starts.
///
/// Rows are read in id order, `page_size` at a time, and each page is
/// written to the cache in one pipelined call. Only missing counters are
/// created: a counter that survived a restart may hold increments the store
/// has not seen yet, and it wins over the persisted value. Seeded counters
/// are not marked dirty.
pub struct WarmUpLoader<C, S> {
    cache: Arc<C>,
    store: Arc<S>,
    page_size: usize,
}

impl<C, S> WarmUpLoader<C, S>
where
    C: ScoreCache,
    S: ScoreStore,
{
    pub fn new(cache: Arc<C>, store: Arc<S>, page_size: usize) -> Self {
        Self {
            cache,
            store,
            page_size,
        }
    }

    /// Copies every persisted counter into the cache.
    ///
    /// Stops at the first failing page. Pages written before the failure
    /// stay in the cache.
    pub async fn run(&self) -> Result<WarmUpReport, WarmUpError> {
        let mut report = WarmUpReport::default();
        let mut after: Option<MemeCoinId> = None;

        loop {
            let page = self
                .store
                .fetch_scores(after, self.page_size)
                .await
                .map_err(|source| WarmUpError::Fetch { after, source })?;
            report.pages += 1;

            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);

            let seeded = self
                .cache
                .seed_scores(&page)
                .await
                .map_err(|source| WarmUpError::Seed {
                    count: page.len(),
                    source,
                })?;
            report.seeded += seeded;
            report.kept += page.len().saturating_sub(seeded);
            debug!(
                page = report.pages,
                rows = page.len(),
                seeded,
                "Seeded warm-up page"
            );

            if page.len() < self.page_size {
                break;
            }
        }

        info!(
            pages = report.pages,
            seeded = report.seeded,
            kept = report.kept,
            "Cache warm-up complete"
        );
        Ok(report)
    }
}
