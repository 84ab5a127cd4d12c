//! Popularity-score write-back cache for MemeCoin records.
//!
//! Increments land in a fast key-value cache and are reconciled into the
//! relational store in batches by a background task:
//!
//! - [`ScoreAccessor`] increments, reads and removes cached counters and
//!   signals changed ids through a bounded, drop-on-full hand-off queue.
//! - [`SyncScheduler`] owns the pending set and triggers a pass when it
//!   reaches `batch_size` ids or when `sync_interval` elapses.
//! - [`BatchReconciler`] copies cached counters into the store inside one
//!   transaction per pass.
//! - [`WarmUpLoader`] seeds the cache from the store before traffic starts.
//!
//! [`bootstrap`] wires all of them together.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use memecoin_cache::InMemoryScoreCache;
//! use memecoin_core::MemeCoinId;
//! use memecoin_popularity::{bootstrap, SyncConfig};
//! use memecoin_storage::InMemoryScoreStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(InMemoryScoreCache::new());
//! let store = Arc::new(InMemoryScoreStore::new());
//!
//! let (service, sync) = bootstrap(cache, store, SyncConfig::default()).await?;
//!
//! service.track(MemeCoinId::new(1), 0).await?;
//! service.increment_popularity(MemeCoinId::new(1)).await?;
//!
//! let summary = sync.shutdown().await?;
//! println!("reconciled {} scores", summary.reconciled);
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod bootstrap;
pub mod config;
pub mod dirty;
pub mod error;
pub mod reconciler;
pub mod scheduler;
pub mod service;
pub mod warmup;

#[cfg(test)]
mod testing;

pub use accessor::ScoreAccessor;
pub use bootstrap::bootstrap;
pub use config::{ConfigError, SyncConfig};
pub use dirty::{dirty_channel, DirtyReceiver, DirtySender, DirtySignal, PendingSet};
pub use error::{PopularityError, SyncError, WarmUpError};
pub use reconciler::{BatchReconciler, ReconcileReport};
pub use scheduler::{SyncHandle, SyncScheduler, SyncSummary};
pub use service::PopularityService;
pub use warmup::{WarmUpLoader, WarmUpReport};
