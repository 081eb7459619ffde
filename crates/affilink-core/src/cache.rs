use crate::error::CacheError;
use crate::model::{LinkId, ResolvedLink};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// How long a `link:{code}` entry lives before it is re-read from the store.
pub const LINK_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache key for the `{id, targetUrl}` entry of a short code.
pub fn link_key(code: &ShortCode) -> String {
    format!("link:{}", code.as_str())
}

/// Cache key for the live click counter of a link.
pub fn clicks_key(id: LinkId) -> String {
    format!("clicks:{}", id)
}

/// A string key-value cache with TTLs and atomic counters.
///
/// The cache is a disposable accelerator: losing its contents must only ever
/// cost latency, never correctness.
#[async_trait]
pub trait KvCache: Send + Sync + 'static {
    /// Returns `Ok(None)` if the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value. `None` means no expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Removes a key. It is not an error if the key does not exist.
    async fn del(&self, key: &str) -> Result<()>;

    /// Atomically increments an integer counter, creating it at 0 first if
    /// absent, and returns the new value.
    async fn incr(&self, key: &str) -> Result<i64>;
}

/// Typed access to the `link:{code}` entries on top of any [`KvCache`].
#[async_trait]
pub trait LinkCacheExt: KvCache {
    async fn get_link(&self, code: &ShortCode) -> Result<Option<ResolvedLink>> {
        let Some(raw) = self.get(&link_key(code)).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(|e| {
            CacheError::InvalidData(format!("invalid cached link for '{}': {e}", code))
        })
    }

    async fn put_link(&self, code: &ShortCode, link: &ResolvedLink, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(link)
            .map_err(|e| CacheError::Serialization(format!("failed to serialize link: {e}")))?;
        self.set(&link_key(code), &json, Some(ttl)).await
    }

    async fn evict_link(&self, code: &ShortCode) -> Result<()> {
        self.del(&link_key(code)).await
    }
}

impl<T: KvCache> LinkCacheExt for T {}
