use affilink_core::{CacheError, StorageError};
use thiserror::Error;

/// Result type for link resolution.
pub type Result<T> = std::result::Result<T, RedirectorError>;

/// Errors that can reach the caller of [`Redirector::resolve`](crate::Redirector::resolve).
///
/// Cache failures never appear here: they degrade to a miss.
#[derive(Debug, Error)]
pub enum RedirectorError {
    #[error("link not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A failed click recording. Only ever logged.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("failed to persist click: {0}")]
    Storage(#[from] StorageError),
    /// The click row was written but the live counter was not bumped.
    #[error("failed to increment live click counter: {0}")]
    Counter(#[from] CacheError),
}
