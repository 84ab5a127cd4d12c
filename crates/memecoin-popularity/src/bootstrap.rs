use crate::accessor::ScoreAccessor;
use crate::config::SyncConfig;
use crate::dirty::dirty_channel;
use crate::error::PopularityError;
use crate::reconciler::BatchReconciler;
use crate::scheduler::{SyncHandle, SyncScheduler};
use crate::service::PopularityService;
use crate::warmup::WarmUpLoader;
use memecoin_core::{ScoreCache, ScoreStore};
use std::sync::Arc;
use tracing::info;

/// Wires the write-back cache together and starts the sync scheduler.
///
/// When `warm_up_on_start` is set, the cache is seeded from the store first
/// and a warm-up failure aborts startup. The returned handle must be shut
/// down to flush counters still pending at exit.
pub async fn bootstrap<C, S>(
    cache: Arc<C>,
    store: Arc<S>,
    config: SyncConfig,
) -> Result<(PopularityService<C>, SyncHandle), PopularityError>
where
    C: ScoreCache,
    S: ScoreStore,
{
    config.validate()?;

    if config.warm_up_on_start {
        WarmUpLoader::new(
            Arc::clone(&cache),
            Arc::clone(&store),
            config.warm_up_page_size,
        )
        .run()
        .await?;
    } else {
        info!("Cache warm-up disabled, starting with the current cache contents");
    }

    let (signals, receiver) = dirty_channel(config.signal_capacity());
    let reconciler = Arc::new(BatchReconciler::new(Arc::clone(&cache), store));
    let handle = SyncScheduler::new(reconciler, receiver, &config)?.spawn();

    Ok((PopularityService::new(ScoreAccessor::new(cache, signals)), handle))
}
