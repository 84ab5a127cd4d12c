//! [`ScoreStore`](memecoin_core::ScoreStore) backends.

pub mod memory;
pub mod mysql;

pub use memecoin_core::{ScoreStore, ScoreTransaction, StorageError};
pub use memory::{InMemoryScoreStore, InMemoryTransaction};
pub use mysql::{MySqlScoreStore, MySqlTransaction};
