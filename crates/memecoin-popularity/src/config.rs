use std::time::Duration;
use thiserror::Error;
use typed_builder::TypedBuilder;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_WARM_UP_PAGE_SIZE: usize = 100;

/// Configuration of the popularity write-back cache.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use memecoin_popularity::SyncConfig;
///
/// let config = SyncConfig::builder()
///     .batch_size(50)
///     .sync_interval(Duration::from_secs(1))
///     .build();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.signal_capacity(), 100);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct SyncConfig {
    /// Number of distinct pending ids that forces an immediate pass.
    #[builder(default = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Period between time-triggered passes.
    #[builder(default = DEFAULT_SYNC_INTERVAL)]
    pub sync_interval: Duration,

    /// Whether [`bootstrap`](crate::bootstrap) seeds the cache from the store.
    #[builder(default = true)]
    pub warm_up_on_start: bool,

    /// Rows read from the store per warm-up page.
    #[builder(default = DEFAULT_WARM_UP_PAGE_SIZE)]
    pub warm_up_page_size: usize,

    /// Capacity of the dirty-signal hand-off queue. Twice the batch size when unset.
    #[builder(default, setter(strip_option))]
    pub signal_capacity: Option<usize>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SyncConfig {
    /// Effective capacity of the hand-off queue.
    pub fn signal_capacity(&self) -> usize {
        self.signal_capacity
            .unwrap_or_else(|| self.batch_size.saturating_mul(2))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.sync_interval.is_zero() {
            return Err(ConfigError::ZeroSyncInterval);
        }
        if self.warm_up_page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.signal_capacity() == 0 {
            return Err(ConfigError::ZeroSignalCapacity);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("sync interval must be greater than zero")]
    ZeroSyncInterval,
    #[error("warm-up page size must be at least 1")]
    ZeroPageSize,
    #[error("signal capacity must be at least 1")]
    ZeroSignalCapacity,
}
