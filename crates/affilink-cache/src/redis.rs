use affilink_core::cache::Result;
use affilink_core::{CacheError, KvCache};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A Redis-based implementation of [`KvCache`].
///
/// Keys are written as given, optionally behind a namespace prefix.
/// TTLs are rounded up to whole seconds because they map onto `SET EX`.
#[derive(Clone)]
pub struct RedisKvCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

impl std::fmt::Debug for RedisKvCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKvCache")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

impl RedisKvCache {
    /// Creates a new Redis cache writing unprefixed keys.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, "")
    }

    /// Creates a new Redis cache with a namespace prefix (e.g. `"affilink:"`).
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a multiplexed connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("failed to create Redis client", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::new(conn))
    }

    /// Replaces the namespace prefix, keeping the connection.
    pub fn prefixed(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl KvCache for RedisKvCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = self.cache_key(key);
        trace!(key = %key, "Fetching value from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(value)) => {
                debug!(key = %key, "Cache hit in Redis");
                Ok(Some(value))
            }
            Ok(None) => {
                trace!(key = %key, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let key = self.cache_key(key);
        trace!(key = %key, ?ttl, "Storing value in Redis cache");

        let mut conn = self.conn.clone();
        let result = match ttl {
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(&key, value, ttl_seconds(ttl))
                    .await
            }
            None => conn.set::<_, _, ()>(&key, value).await,
        };

        result.map_err(|e| {
            warn!(key = %key, error = %e, "Failed to write value to Redis");
            map_redis_error("failed to write value to Redis", e)
        })
    }

    async fn del(&self, key: &str) -> Result<()> {
        let key = self.cache_key(key);
        trace!(key = %key, "Removing value from Redis cache");

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&key).await.map_err(|e| {
            warn!(key = %key, error = %e, "Failed to remove value from Redis");
            map_redis_error("failed to delete value from Redis", e)
        })
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let key = self.cache_key(key);
        trace!(key = %key, "Incrementing counter in Redis");

        let mut conn = self.conn.clone();
        conn.incr::<_, _, i64>(&key, 1).await.map_err(|e| {
            warn!(key = %key, error = %e, "Failed to increment counter in Redis");
            map_redis_error("failed to increment counter in Redis", e)
        })
    }
}
