use async_trait::async_trait;
use memecoin_core::store::Result;
use memecoin_core::{MemeCoinId, ScoreRow, ScoreStore, ScoreTransaction};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

type Rows = Arc<RwLock<BTreeMap<MemeCoinId, i64>>>;

/// In-memory implementation of the score store.
///
/// Rows are kept ordered by id so pagination matches the MySQL store.
/// Clones share the same rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScoreStore {
    rows: Rows,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `rows`.
    pub fn with_rows(rows: impl IntoIterator<Item = ScoreRow>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| (row.id, row.popularity_score))
            .collect();
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    /// Inserts or replaces a row.
    pub async fn insert(&self, id: MemeCoinId, popularity_score: i64) {
        self.rows.write().await.insert(id, popularity_score);
    }

    /// Deletes a row. Returns `true` if it existed.
    pub async fn remove(&self, id: MemeCoinId) -> bool {
        self.rows.write().await.remove(&id).is_some()
    }

    /// Reads the persisted score of a row.
    pub async fn score(&self, id: MemeCoinId) -> Option<i64> {
        self.rows.read().await.get(&id).copied()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        Ok(InMemoryTransaction {
            rows: Arc::clone(&self.rows),
            staged: Vec::new(),
        })
    }

    async fn fetch_scores(&self, after: Option<MemeCoinId>, limit: usize) -> Result<Vec<ScoreRow>> {
        let lower = match after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };

        let rows = self.rows.read().await;
        Ok(rows
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(id, score)| ScoreRow {
                id: *id,
                popularity_score: *score,
            })
            .collect())
    }
}

/// A transaction that stages updates until commit.
#[derive(Debug)]
pub struct InMemoryTransaction {
    rows: Rows,
    staged: Vec<(MemeCoinId, i64)>,
}

#[async_trait]
impl ScoreTransaction for InMemoryTransaction {
    async fn update_score(&mut self, id: MemeCoinId, score: i64) -> Result<bool> {
        if !self.rows.read().await.contains_key(&id) {
            return Ok(false);
        }
        self.staged.push((id, score));
        Ok(true)
    }

    async fn commit(self) -> Result<()> {
        let mut rows = self.rows.write().await;
        for (id, score) in self.staged {
            // A row deleted after staging stays deleted, as an UPDATE would.
            if let Some(current) = rows.get_mut(&id) {
                *current = score;
            }
        }
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
