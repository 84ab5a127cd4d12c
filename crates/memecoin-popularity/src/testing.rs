//! Fault-injecting cache and store doubles shared by the unit tests.

use async_trait::async_trait;
use memecoin_cache::InMemoryScoreCache;
use memecoin_core::{
    CacheError, MemeCoinId, ScoreCache, ScoreRow, ScoreStore, ScoreTransaction, StorageError,
};
use memecoin_storage::{InMemoryScoreStore, InMemoryTransaction};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// An in-memory cache whose operations can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyCache {
    inner: InMemoryScoreCache,
    unavailable: AtomicBool,
    reads_fail: AtomicBool,
    exists_always: AtomicBool,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes only `get_score` fail.
    pub fn set_reads_fail(&self, fail: bool) {
        self.reads_fail.store(fail, Ordering::SeqCst);
    }

    /// Makes `exists` report every id as present, as a check that raced a removal would.
    pub fn set_exists_always(&self, always: bool) {
        self.exists_always.store(always, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ScoreCache for FlakyCache {
    async fn incr(&self, id: MemeCoinId) -> Result<i64, CacheError> {
        self.check()?;
        self.inner.incr(id).await
    }

    async fn incr_existing(&self, id: MemeCoinId) -> Result<Option<i64>, CacheError> {
        self.check()?;
        self.inner.incr_existing(id).await
    }

    async fn get_score(&self, id: MemeCoinId) -> Result<Option<i64>, CacheError> {
        self.check()?;
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(CacheError::Timeout("read timed out".to_string()));
        }
        self.inner.get_score(id).await
    }

    async fn set_score(&self, id: MemeCoinId, score: i64) -> Result<(), CacheError> {
        self.check()?;
        self.inner.set_score(id, score).await
    }

    async fn seed_scores(&self, rows: &[ScoreRow]) -> Result<usize, CacheError> {
        self.check()?;
        self.inner.seed_scores(rows).await
    }

    async fn del(&self, id: MemeCoinId) -> Result<(), CacheError> {
        self.check()?;
        self.inner.del(id).await
    }

    async fn exists(&self, id: MemeCoinId) -> Result<bool, CacheError> {
        self.check()?;
        if self.exists_always.load(Ordering::SeqCst) {
            return Ok(true);
        }
        self.inner.exists(id).await
    }
}

#[derive(Debug, Default)]
struct Recorded {
    begins: usize,
    rollbacks: usize,
    commits: Vec<Vec<MemeCoinId>>,
    fetch_cursors: Vec<Option<MemeCoinId>>,
    fail_begin: bool,
    fail_fetch: bool,
    fail_next_commits: usize,
    fail_updates: HashSet<MemeCoinId>,
}

/// An in-memory store that records transactions and can inject failures.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    inner: InMemoryScoreStore,
    state: Arc<Mutex<Recorded>>,
}

impl RecordingStore {
    pub fn with_rows(rows: impl IntoIterator<Item = ScoreRow>) -> Self {
        Self {
            inner: InMemoryScoreStore::with_rows(rows),
            state: Arc::default(),
        }
    }

    pub async fn score(&self, id: MemeCoinId) -> Option<i64> {
        self.inner.score(id).await
    }

    /// Ids of every committed transaction, sorted within each transaction.
    pub fn commits(&self) -> Vec<Vec<MemeCoinId>> {
        self.state().commits.clone()
    }

    pub fn begins(&self) -> usize {
        self.state().begins
    }

    pub fn rollbacks(&self) -> usize {
        self.state().rollbacks
    }

    pub fn fetch_cursors(&self) -> Vec<Option<MemeCoinId>> {
        self.state().fetch_cursors.clone()
    }

    pub fn fail_begin(&self, fail: bool) {
        self.state().fail_begin = fail;
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.state().fail_fetch = fail;
    }

    pub fn fail_next_commits(&self, count: usize) {
        self.state().fail_next_commits = count;
    }

    pub fn fail_update(&self, id: MemeCoinId) {
        self.state().fail_updates.insert(id);
    }

    fn state(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl ScoreStore for RecordingStore {
    type Transaction = RecordingTransaction;

    async fn begin(&self) -> Result<RecordingTransaction, StorageError> {
        {
            let mut state = self.state();
            state.begins += 1;
            if state.fail_begin {
                return Err(StorageError::Unavailable("pool exhausted".to_string()));
            }
        }
        Ok(RecordingTransaction {
            inner: self.inner.begin().await?,
            staged: Vec::new(),
            state: Arc::clone(&self.state),
        })
    }

    async fn fetch_scores(
        &self,
        after: Option<MemeCoinId>,
        limit: usize,
    ) -> Result<Vec<ScoreRow>, StorageError> {
        {
            let mut state = self.state();
            state.fetch_cursors.push(after);
            if state.fail_fetch {
                return Err(StorageError::Timeout("query timed out".to_string()));
            }
        }
        self.inner.fetch_scores(after, limit).await
    }
}

pub struct RecordingTransaction {
    inner: InMemoryTransaction,
    staged: Vec<MemeCoinId>,
    state: Arc<Mutex<Recorded>>,
}

#[async_trait]
impl ScoreTransaction for RecordingTransaction {
    async fn update_score(&mut self, id: MemeCoinId, score: i64) -> Result<bool, StorageError> {
        if self.state.lock().unwrap().fail_updates.contains(&id) {
            return Err(StorageError::Query(format!("update of {id} rejected")));
        }
        let updated = self.inner.update_score(id, score).await?;
        if updated {
            self.staged.push(id);
        }
        Ok(updated)
    }

    async fn commit(mut self) -> Result<(), StorageError> {
        let fail = {
            let mut state = self.state.lock().unwrap();
            if state.fail_next_commits > 0 {
                state.fail_next_commits -= 1;
                true
            } else {
                false
            }
        };
        if fail {
            self.inner.rollback().await?;
            return Err(StorageError::Unavailable("connection lost".to_string()));
        }

        self.inner.commit().await?;
        self.staged.sort_unstable();
        self.state.lock().unwrap().commits.push(self.staged);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        self.state.lock().unwrap().rollbacks += 1;
        self.inner.rollback().await
    }
}
