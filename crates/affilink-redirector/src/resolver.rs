use crate::error::{RedirectorError, Result};
use affilink_core::{KvCache, LinkCacheExt, ReadRepository, ResolvedLink, ShortCode, LINK_CACHE_TTL};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code to the link id and target URL.
    /// Fails with [`RedirectorError::NotFound`] if the code is unknown.
    async fn resolve(&self, code: &ShortCode) -> Result<ResolvedLink>;
}

/// Cache-then-store link resolution.
///
/// The cache is a soft dependency. A failed or corrupt read is treated as a
/// miss and a failed write is ignored, so resolution only ever fails when the
/// store does.
#[derive(Debug)]
pub struct LinkResolver<R, C> {
    repository: Arc<R>,
    cache: Arc<C>,
    ttl: Duration,
}

impl<R, C> Clone for LinkResolver<R, C> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
        }
    }
}

impl<R: ReadRepository, C: KvCache> LinkResolver<R, C> {
    /// Creates a resolver caching links for [`LINK_CACHE_TTL`].
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self::with_ttl(repository, cache, LINK_CACHE_TTL)
    }

    pub fn with_ttl(repository: Arc<R>, cache: Arc<C>, ttl: Duration) -> Self {
        Self {
            repository,
            cache,
            ttl,
        }
    }

    async fn cached(&self, code: &ShortCode) -> Option<ResolvedLink> {
        match self.cache.get_link(code).await {
            Ok(Some(link)) => {
                debug!(code = %code, link_id = %link.id, "Resolved short code from cache");
                Some(link)
            }
            Ok(None) => {
                trace!(code = %code, "Cache miss, falling back to store");
                None
            }
            Err(e) => {
                warn!(code = %code, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }
}

#[async_trait]
impl<R: ReadRepository, C: KvCache> Redirector for LinkResolver<R, C> {
    async fn resolve(&self, code: &ShortCode) -> Result<ResolvedLink> {
        trace!(code = %code, "resolving short code");

        if let Some(link) = self.cached(code).await {
            return Ok(link);
        }

        let Some(link) = self.repository.get_by_short_code(code).await? else {
            trace!(code = %code, "Short code not found");
            return Err(RedirectorError::NotFound(code.to_string()));
        };

        let resolved = link.resolved();
        if let Err(e) = self.cache.put_link(code, &resolved, self.ttl).await {
            warn!(code = %code, error = %e, "Failed to populate link cache");
        }

        debug!(code = %code, link_id = %resolved.id, "Resolved short code from store");
        Ok(resolved)
    }
}
