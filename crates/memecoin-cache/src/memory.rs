use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use memecoin_core::cache::Result;
use memecoin_core::{MemeCoinId, ScoreCache, ScoreRow};

/// In-process implementation of [`ScoreCache`] using DashMap.
///
/// Increments go through the entry API, which holds the shard lock for the
/// key while the counter is updated.
#[derive(Debug, Default)]
pub struct InMemoryScoreCache {
    scores: DashMap<MemeCoinId, i64>,
}

impl InMemoryScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of counters currently held.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[async_trait]
impl ScoreCache for InMemoryScoreCache {
    async fn incr(&self, id: MemeCoinId) -> Result<i64> {
        let mut score = self.scores.entry(id).or_insert(0);
        *score += 1;
        Ok(*score)
    }

    async fn incr_existing(&self, id: MemeCoinId) -> Result<Option<i64>> {
        Ok(self.scores.get_mut(&id).map(|mut score| {
            *score += 1;
            *score
        }))
    }

    async fn get_score(&self, id: MemeCoinId) -> Result<Option<i64>> {
        Ok(self.scores.get(&id).map(|score| *score))
    }

    async fn set_score(&self, id: MemeCoinId, score: i64) -> Result<()> {
        self.scores.insert(id, score);
        Ok(())
    }

    async fn seed_scores(&self, rows: &[ScoreRow]) -> Result<usize> {
        let mut seeded = 0;
        for row in rows {
            if let Entry::Vacant(entry) = self.scores.entry(row.id) {
                entry.insert(row.popularity_score);
                seeded += 1;
            }
        }
        Ok(seeded)
    }

    async fn del(&self, id: MemeCoinId) -> Result<()> {
        self.scores.remove(&id);
        Ok(())
    }

    async fn exists(&self, id: MemeCoinId) -> Result<bool> {
        Ok(self.scores.contains_key(&id))
    }
}
