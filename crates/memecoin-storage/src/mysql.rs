use async_trait::async_trait;
use memecoin_core::store::Result;
use memecoin_core::{MemeCoinId, ScoreRow, ScoreStore, ScoreTransaction, StorageError};
use sqlx::{MySql, MySqlPool, Row, Transaction};
use tracing::trace;

/// MySQL implementation of the score store contract.
///
/// Only the `popularity_score` column of `meme_coins` is touched. Rows are
/// created and deleted by the CRUD layer.
#[derive(Debug, Clone)]
pub struct MySqlScoreStore {
    pool: MySqlPool,
}

impl MySqlScoreStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn limit_param(limit: usize) -> Result<i64> {
    i64::try_from(limit)
        .map_err(|_| StorageError::Operation(format!("page size {limit} is out of range")))
}

#[async_trait]
impl ScoreStore for MySqlScoreStore {
    type Transaction = MySqlTransaction;

    async fn begin(&self) -> Result<MySqlTransaction> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(MySqlTransaction { tx })
    }

    async fn fetch_scores(&self, after: Option<MemeCoinId>, limit: usize) -> Result<Vec<ScoreRow>> {
        // Keyset pagination: rows inserted during a scan land after the
        // cursor instead of shifting an OFFSET window.
        let after = after.map(MemeCoinId::get).unwrap_or(i64::MIN);

        let rows = sqlx::query(
            r#"
            SELECT id, popularity_score
            FROM meme_coins
            WHERE id > ?
            ORDER BY id
            LIMIT ?
            "#,
        )
        .bind(after)
        .bind(limit_param(limit)?)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
                let popularity_score: i64 =
                    row.try_get("popularity_score").map_err(map_sqlx_error)?;
                Ok(ScoreRow::new(id, popularity_score))
            })
            .collect()
    }
}

/// An open MySQL transaction.
///
/// Dropping it while still open (including after a failed commit) makes
/// sqlx issue a `ROLLBACK` before the connection returns to the pool.
pub struct MySqlTransaction {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl ScoreTransaction for MySqlTransaction {
    async fn update_score(&mut self, id: MemeCoinId, score: i64) -> Result<bool> {
        trace!(id = %id, score, "Staging popularity score update");

        // sqlx negotiates CLIENT_FOUND_ROWS, so rows_affected counts matched
        // rows even when the value is unchanged.
        let result = sqlx::query(
            r#"
            UPDATE meme_coins
            SET popularity_score = ?
            WHERE id = ?
            "#,
        )
        .bind(score)
        .bind(id.get())
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}
