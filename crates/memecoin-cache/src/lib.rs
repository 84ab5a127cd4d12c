//! [`ScoreCache`](memecoin_core::ScoreCache) backends.
//!
//! [`RedisScoreCache`] is the production backend; [`InMemoryScoreCache`]
//! keeps counters in process for local runs and tests.

pub mod memory;
pub mod redis;

pub use memory::InMemoryScoreCache;
pub use redis::{RedisScoreCache, DEFAULT_KEY_PREFIX};
