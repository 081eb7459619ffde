use affilink_core::cache::Result as CacheResult;
use affilink_core::repository::Result;
use affilink_core::{
    CacheError, CampaignId, Click, ClickRepository, KvCache, Link, LinkId, Marketplace,
    NewClick, ProductId, ReadRepository, ShortCode, StorageError,
};
use affilink_storage::InMemoryRepository;
use async_trait::async_trait;
use jiff::Timestamp;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn link(code: &str, target_url: &str) -> Link {
    let now = Timestamp::now();
    Link {
        id: LinkId::new(),
        product_id: ProductId::new(),
        campaign_id: CampaignId::new(),
        marketplace: Marketplace::Lazada,
        short_code: ShortCode::new_unchecked(code),
        target_url: target_url.to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// In-memory store that counts short-code lookups and can be told to fail.
#[derive(Debug, Default)]
pub struct CountingStore {
    pub inner: InMemoryRepository,
    reads: AtomicUsize,
    fail: bool,
}

impl CountingStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn short_code_reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(StorageError::Unavailable("store is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadRepository for CountingStore {
    async fn get_by_short_code(&self, code: &ShortCode) -> Result<Option<Link>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get_by_short_code(code).await
    }

    async fn get_link(&self, id: LinkId) -> Result<Option<Link>> {
        self.check()?;
        self.inner.get_link(id).await
    }
}

#[async_trait]
impl ClickRepository for CountingStore {
    async fn insert_click(&self, click: NewClick) -> Result<Click> {
        self.check()?;
        self.inner.insert_click(click).await
    }

    async fn count_clicks(&self, link_id: LinkId) -> Result<u64> {
        self.check()?;
        self.inner.count_clicks(link_id).await
    }

    async fn click_times_since(&self, since: Timestamp) -> Result<Vec<Timestamp>> {
        self.check()?;
        self.inner.click_times_since(since).await
    }
}

/// A cache whose every operation fails as if the backend were unreachable.
#[derive(Debug)]
pub struct FailingCache;

fn unavailable<T>() -> CacheResult<T> {
    Err(CacheError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl KvCache for FailingCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        unavailable()
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> CacheResult<()> {
        unavailable()
    }

    async fn del(&self, _key: &str) -> CacheResult<()> {
        unavailable()
    }

    async fn incr(&self, _key: &str) -> CacheResult<i64> {
        unavailable()
    }
}
