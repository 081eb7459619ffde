use crate::error::RecordingError;
use affilink_core::{clicks_key, Click, ClickRepository, ClientHash, KvCache, LinkId, NewClick};
use async_trait::async_trait;
use jiff::Timestamp;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, trace};

/// Request metadata captured for one redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub link_id: LinkId,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    /// Raw caller address. Hashed before anything is stored.
    pub client_address: Option<String>,
}

/// Derives the stored client identifier: the first 16 hex chars of the
/// SHA-256 digest of the raw address.
pub fn hash_client_address(address: &str) -> ClientHash {
    let digest = Sha256::digest(address.as_bytes());
    let hex: String = digest[..ClientHash::HEX_LEN / 2]
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect();
    ClientHash::new_unchecked(hex)
}

#[async_trait]
pub trait ClickSink: Send + Sync + 'static {
    /// Durably records one click and bumps the link's live counter.
    async fn record(&self, event: ClickEvent) -> Result<Click, RecordingError>;
}

pub struct ClickRecorder<S, C> {
    store: Arc<S>,
    cache: Arc<C>,
}

impl<S, C> ClickRecorder<S, C> {
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl<S: ClickRepository, C: KvCache> ClickSink for ClickRecorder<S, C> {
    async fn record(&self, event: ClickEvent) -> Result<Click, RecordingError> {
        let link_id = event.link_id;
        trace!(link_id = %link_id, "Recording click");

        let click = NewClick {
            link_id,
            timestamp: Timestamp::now(),
            referrer: event.referrer,
            user_agent: event.user_agent,
            client_hash: event.client_address.as_deref().map(hash_client_address),
        };
        let click = self.store.insert_click(click).await?;

        let live = self.cache.incr(&clicks_key(link_id)).await?;
        debug!(link_id = %link_id, click_id = click.id, live, "Recorded click");
        Ok(click)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{link, CountingStore, FailingCache};
    use affilink_cache::MokaKvCache;
    use affilink_core::{LinkRepository, StorageError};

    fn event(link_id: LinkId, address: Option<&str>) -> ClickEvent {
        ClickEvent {
            link_id,
            referrer: Some("https://facebook.com".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            client_address: address.map(str::to_string),
        }
    }

    async fn store_with_link(code: &str) -> (Arc<CountingStore>, LinkId) {
        let store = Arc::new(CountingStore::default());
        let link = link(code, "https://shopee.co.th/Matcha-Powder-456");
        store.inner.insert_link(&link).await.unwrap();
        (store, link.id)
    }

    #[test]
    fn hash_is_fixed_length_hex_and_deterministic() {
        let first = hash_client_address("203.0.113.7");
        let second = hash_client_address("203.0.113.7");

        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), ClientHash::HEX_LEN);
        assert!(first
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_ne!(first, hash_client_address("203.0.113.8"));
    }

    #[test]
    fn hash_matches_sha256_prefix() {
        // sha256("127.0.0.1") = 12ca17b49af22894...
        assert_eq!(hash_client_address("127.0.0.1").as_str(), "12ca17b49af22894");
    }

    #[tokio::test]
    async fn record_persists_one_row_and_bumps_counter() {
        let (store, link_id) = store_with_link("matcha-sp").await;
        let cache = Arc::new(MokaKvCache::new());
        let recorder = ClickRecorder::new(Arc::clone(&store), Arc::clone(&cache));

        let click = recorder
            .record(event(link_id, Some("203.0.113.7")))
            .await
            .unwrap();

        assert_eq!(click.link_id, link_id);
        assert_eq!(click.referrer.as_deref(), Some("https://facebook.com"));
        assert_eq!(store.inner.count_clicks(link_id).await.unwrap(), 1);
        assert_eq!(
            cache.get(&clicks_key(link_id)).await.unwrap().as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn raw_address_is_never_stored() {
        let (store, link_id) = store_with_link("matcha-sp").await;
        let recorder = ClickRecorder::new(store, Arc::new(MokaKvCache::new()));

        let click = recorder
            .record(event(link_id, Some("203.0.113.7")))
            .await
            .unwrap();
        let stored = click.client_hash.unwrap();

        assert_ne!(stored.as_str(), "203.0.113.7");
        assert_eq!(stored, hash_client_address("203.0.113.7"));
    }

    #[tokio::test]
    async fn optional_fields_may_be_absent() {
        let (store, link_id) = store_with_link("matcha-sp").await;
        let recorder = ClickRecorder::new(store, Arc::new(MokaKvCache::new()));

        let click = recorder
            .record(ClickEvent {
                link_id,
                referrer: None,
                user_agent: None,
                client_address: None,
            })
            .await
            .unwrap();

        assert!(click.referrer.is_none());
        assert!(click.user_agent.is_none());
        assert!(click.client_hash.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_recordings_across_links_are_exact() {
        let store = Arc::new(CountingStore::default());
        let a = link("link-a", "https://www.lazada.co.th/a");
        let b = link("link-b", "https://shopee.co.th/b");
        store.inner.insert_link(&a).await.unwrap();
        store.inner.insert_link(&b).await.unwrap();
        let cache = Arc::new(MokaKvCache::new());
        let recorder = Arc::new(ClickRecorder::new(Arc::clone(&store), Arc::clone(&cache)));

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let recorder = Arc::clone(&recorder);
                let link_id = if i % 2 == 0 { a.id } else { b.id };
                tokio::spawn(async move { recorder.record(event(link_id, None)).await.unwrap() })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        for id in [a.id, b.id] {
            assert_eq!(store.inner.count_clicks(id).await.unwrap(), 25);
            assert_eq!(
                cache.get(&clicks_key(id)).await.unwrap().as_deref(),
                Some("25")
            );
        }
    }

    #[tokio::test]
    async fn store_failure_skips_counter() {
        let store = Arc::new(CountingStore::failing());
        let cache = Arc::new(MokaKvCache::new());
        let recorder = ClickRecorder::new(store, Arc::clone(&cache));
        let link_id = LinkId::new();

        let err = recorder.record(event(link_id, None)).await.unwrap_err();

        assert!(matches!(
            err,
            RecordingError::Storage(StorageError::Unavailable(_))
        ));
        assert!(cache.get(&clicks_key(link_id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn counter_failure_keeps_persisted_click() {
        let (store, link_id) = store_with_link("matcha-sp").await;
        let recorder = ClickRecorder::new(Arc::clone(&store), Arc::new(FailingCache));

        let err = recorder.record(event(link_id, None)).await.unwrap_err();

        assert!(matches!(err, RecordingError::Counter(_)));
        assert_eq!(store.inner.count_clicks(link_id).await.unwrap(), 1);
    }
}
