use ::moka::future::Cache;
use ::moka::ops::compute::{CompResult, Op};
use ::moka::Expiry;
use affilink_core::cache::Result;
use affilink_core::{CacheError, KvCache};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// How an entry's expiry behaves when it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifetime {
    /// Expire this long after the write.
    Expires(Duration),
    /// Never expire.
    Persistent,
    /// Keep whatever expiry the previous value had (counter increments).
    Keep,
}

#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    lifetime: Lifetime,
}

struct PerEntryExpiry;

impl Expiry<String, CachedValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        match value.lifetime {
            Lifetime::Expires(ttl) => Some(ttl),
            Lifetime::Persistent | Lifetime::Keep => None,
        }
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        match value.lifetime {
            Lifetime::Expires(ttl) => Some(ttl),
            Lifetime::Persistent => None,
            Lifetime::Keep => duration_until_expiry,
        }
    }
}

/// An in-memory [`KvCache`] built on Moka.
///
/// Each entry carries its own TTL, so link entries expire after their TTL
/// while counters created by [`KvCache::incr`] live until evicted. Clones
/// share the same underlying cache.
#[derive(Debug, Clone)]
pub struct MokaKvCache {
    cache: Cache<String, CachedValue>,
}

impl MokaKvCache {
    /// Creates a cache holding at most 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    /// Creates a cache with a custom maximum capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        CacheConfig::builder().max_capacity(max_capacity).build().into()
    }

    /// Returns a builder for creating a custom cache configuration.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfig::builder()
    }

    /// Number of live entries, after pending maintenance has run.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for MokaKvCache {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_counter(key: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|e| {
        CacheError::InvalidData(format!("value at '{key}' is not an integer: {e}"))
    })
}

#[async_trait]
impl KvCache for MokaKvCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        trace!(key, "Fetching value from Moka cache");

        match self.cache.get(key).await {
            Some(entry) => {
                debug!(key, "Cache hit in Moka");
                Ok(Some(entry.value))
            }
            None => {
                trace!(key, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        trace!(key, ?ttl, "Storing value in Moka cache");

        let lifetime = ttl.map_or(Lifetime::Persistent, Lifetime::Expires);
        self.cache
            .insert(
                key.to_string(),
                CachedValue {
                    value: value.to_string(),
                    lifetime,
                },
            )
            .await;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        trace!(key, "Removing value from Moka cache");
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let owned_key = key.to_string();
        let result = self
            .cache
            .entry(owned_key.clone())
            .and_try_compute_with(|existing| async move {
                let current = match existing {
                    Some(entry) => parse_counter(&owned_key, &entry.into_value().value)?,
                    None => 0,
                };
                let next = current.checked_add(1).ok_or_else(|| {
                    CacheError::InvalidData(format!("counter at '{owned_key}' overflowed"))
                })?;
                Ok::<_, CacheError>(Op::Put(CachedValue {
                    value: next.to_string(),
                    lifetime: Lifetime::Keep,
                }))
            })
            .await?;

        match result {
            CompResult::Inserted(entry) | CompResult::ReplacedWith(entry) => {
                let value = parse_counter(key, &entry.value().value)?;
                trace!(key, value, "Incremented counter in Moka cache");
                Ok(value)
            }
            _ => Err(CacheError::Operation(format!(
                "counter at '{key}' was not written"
            ))),
        }
    }
}

/// Configuration for creating a [`MokaKvCache`] with custom settings.
#[derive(Debug, TypedBuilder, Default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default, setter(strip_option))]
    max_capacity: Option<u64>,
}

impl From<CacheConfig> for MokaKvCache {
    fn from(config: CacheConfig) -> Self {
        let mut builder = Cache::builder().expire_after(PerEntryExpiry);

        if let Some(capacity) = config.max_capacity {
            builder = builder.max_capacity(capacity);
        }

        MokaKvCache {
            cache: builder.build(),
        }
    }
}
