//! Core types and traits for the MemeCoin popularity write-back cache.
//!
//! This crate provides the shared identifiers, error types and the two
//! outbound collaborator contracts: the key-value [`ScoreCache`] and the
//! transactional relational [`ScoreStore`].

pub mod cache;
pub mod error;
pub mod score;
pub mod store;

pub use cache::ScoreCache;
pub use error::{CacheError, StorageError};
pub use score::{MemeCoinId, ScoreRow};
pub use store::{ScoreStore, ScoreTransaction};
