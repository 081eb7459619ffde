use thiserror::Error;

/// Errors raised by [`KvCache`](crate::cache::KvCache) backends.
///
/// Every variant is a soft failure for the redirect path: callers treat a
/// failed read as a miss and a failed write as a no-op.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Errors raised by the persistent store.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortCodeError {
    #[error("invalid short code: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketplaceError {
    #[error("unknown marketplace: {0}")]
    Unknown(String),
    #[error("invalid offer url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
