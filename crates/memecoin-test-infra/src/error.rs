use thiserror::Error;

/// Failures while starting or connecting to a disposable test server.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("failed to run container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("failed to reach redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to reach mysql: {0}")]
    MySql(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
