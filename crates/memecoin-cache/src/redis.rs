use async_trait::async_trait;
use memecoin_core::cache::Result;
use memecoin_core::{CacheError, MemeCoinId, ScoreCache, ScoreRow};
use redis::AsyncCommands;
use tracing::{debug, trace, warn};

/// Key prefix under which popularity counters are stored.
pub const DEFAULT_KEY_PREFIX: &str = "meme:popularity_score:";

/// `INCR` only if the key exists; replies nil otherwise.
const INCR_EXISTING_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return redis.call('INCR', KEYS[1])
end
return false
"#;

/// A Redis-based implementation of [`ScoreCache`].
///
/// Each counter is a plain Redis integer stored under `prefix + id`, so the
/// increment is Redis' own atomic `INCR`.
#[derive(Debug, Clone)]
pub struct RedisScoreCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
    incr_existing: redis::Script,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() || message.to_ascii_lowercase().contains("timed out") {
        CacheError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisScoreCache {
    /// Creates a new Redis score cache using [`DEFAULT_KEY_PREFIX`].
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a new Redis score cache with a custom key prefix.
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            incr_existing: redis::Script::new(INCR_EXISTING_SCRIPT),
        }
    }

    /// Opens a multiplexed connection to `redis_url` and wraps it.
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("invalid Redis url", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::with_prefix(conn, key_prefix))
    }

    fn cache_key(&self, id: MemeCoinId) -> String {
        format!("{}{}", self.key_prefix, id)
    }
}

fn parse_score(key: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|e| {
        CacheError::InvalidData(format!("invalid counter value '{raw}' for key '{key}': {e}"))
    })
}

#[async_trait]
impl ScoreCache for RedisScoreCache {
    async fn incr(&self, id: MemeCoinId) -> Result<i64> {
        let key = self.cache_key(id);
        trace!(id = %id, "Incrementing popularity counter in Redis");

        let mut conn = self.conn.clone();
        match conn.incr::<_, _, i64>(&key, 1_i64).await {
            Ok(score) => {
                trace!(id = %id, score, "Incremented popularity counter");
                Ok(score)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Redis error on incr");
                Err(map_redis_error("failed to increment value in Redis", e))
            }
        }
    }

    async fn incr_existing(&self, id: MemeCoinId) -> Result<Option<i64>> {
        let key = self.cache_key(id);
        trace!(id = %id, "Incrementing existing popularity counter in Redis");

        let mut conn = self.conn.clone();
        match self
            .incr_existing
            .key(&key)
            .invoke_async::<Option<i64>>(&mut conn)
            .await
        {
            Ok(Some(score)) => {
                trace!(id = %id, score, "Incremented popularity counter");
                Ok(Some(score))
            }
            Ok(None) => {
                trace!(id = %id, "No counter to increment in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Redis error on conditional incr");
                Err(map_redis_error("failed to increment value in Redis", e))
            }
        }
    }

    async fn get_score(&self, id: MemeCoinId) -> Result<Option<i64>> {
        let key = self.cache_key(id);
        trace!(id = %id, "Fetching popularity counter from Redis");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => parse_score(&key, &raw).map(Some),
            Ok(None) => {
                trace!(id = %id, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set_score(&self, id: MemeCoinId, score: i64) -> Result<()> {
        let key = self.cache_key(id);
        trace!(id = %id, score, "Storing popularity counter in Redis");

        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(&key, score).await.map_err(|e| {
            warn!(id = %id, error = %e, "Failed to store counter in Redis");
            map_redis_error("failed to write value to Redis", e)
        })
    }

    async fn seed_scores(&self, rows: &[ScoreRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut pipe = redis::pipe();
        for row in rows {
            pipe.cmd("SET")
                .arg(self.cache_key(row.id))
                .arg(row.popularity_score)
                .arg("NX");
        }

        let mut conn = self.conn.clone();
        match pipe.query_async::<Vec<redis::Value>>(&mut conn).await {
            Ok(replies) => {
                // SET NX replies nil when the key already exists.
                let seeded = replies
                    .iter()
                    .filter(|reply| !matches!(reply, redis::Value::Nil))
                    .count();
                debug!(
                    count = rows.len(),
                    seeded,
                    "Seeded missing popularity counters in Redis"
                );
                Ok(seeded)
            }
            Err(e) => {
                warn!(count = rows.len(), error = %e, "Pipelined write to Redis failed");
                Err(map_redis_error("failed to write values to Redis", e))
            }
        }
    }

    async fn del(&self, id: MemeCoinId) -> Result<()> {
        let key = self.cache_key(id);
        trace!(id = %id, "Removing popularity counter from Redis");

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(&key).await {
            Ok(()) => {
                debug!(id = %id, "Removed popularity counter from Redis");
                Ok(())
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to remove counter from Redis");
                Err(map_redis_error("failed to delete value from Redis", e))
            }
        }
    }

    async fn exists(&self, id: MemeCoinId) -> Result<bool> {
        let key = self.cache_key(id);

        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(&key)
            .await
            .map_err(|e| map_redis_error("failed to check key in Redis", e))
    }
}
