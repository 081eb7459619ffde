//! Disposable containers for integration tests.
//!
//! Each fixture owns its container; dropping the fixture stops it.

pub mod mysql;
pub mod redis;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    /// The container failed to start or to report its mapped port.
    #[error("failed to run test container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    /// The fixture started but a client could not connect to it.
    #[error("failed to connect to Redis fixture: {0}")]
    RedisClient(#[from] ::redis::RedisError),
}

pub type Result<T> = std::result::Result<T, FixtureError>;
