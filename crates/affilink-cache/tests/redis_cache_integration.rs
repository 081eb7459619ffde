use std::time::Duration;

use affilink_cache::RedisKvCache;
use affilink_core::{CacheError, KvCache, LinkCacheExt, LinkId, ResolvedLink, ShortCode};
use affilink_test_infra::redis::RedisServer;
use redis::AsyncCommands;

struct Fixture {
    _redis: RedisServer,
    conn: redis::aio::MultiplexedConnection,
}

impl Fixture {
    async fn start() -> Self {
        let redis = RedisServer::new().await.expect("start redis");
        let conn = redis.connection().await.expect("redis connection");
        Self {
            _redis: redis,
            conn,
        }
    }

    fn cache(&self) -> RedisKvCache {
        RedisKvCache::new(self.conn.clone())
    }
}

#[tokio::test]
async fn set_get_and_del() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache();

    assert!(cache.get("link:abc").await.unwrap().is_none());

    cache.set("link:abc", "value", None).await.unwrap();
    assert_eq!(
        cache.get("link:abc").await.unwrap().as_deref(),
        Some("value")
    );

    cache.del("link:abc").await.unwrap();
    assert!(cache.get("link:abc").await.unwrap().is_none());
    cache.del("link:abc").await.unwrap();
}

#[tokio::test]
async fn set_with_ttl_uses_set_ex() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache();

    cache
        .set("link:ttl", "value", Some(Duration::from_secs(86_400)))
        .await
        .unwrap();

    let mut conn = fixture.conn.clone();
    let ttl: i64 = conn.ttl("link:ttl").await.unwrap();
    assert!(ttl > 86_000 && ttl <= 86_400, "unexpected ttl {ttl}");

    cache
        .set("link:short", "value", Some(Duration::from_secs(1)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(cache.get("link:short").await.unwrap().is_none());
}

#[tokio::test]
async fn incr_counts_from_one() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache();

    assert_eq!(cache.incr("clicks:a").await.unwrap(), 1);
    assert_eq!(cache.incr("clicks:a").await.unwrap(), 2);
    assert_eq!(cache.get("clicks:a").await.unwrap().as_deref(), Some("2"));

    cache.set("clicks:b", "not a number", None).await.unwrap();
    assert!(cache.incr("clicks:b").await.is_err());
}

#[tokio::test]
async fn link_entries_use_camel_case_json() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache();
    let code = ShortCode::new("matcha-lz").unwrap();
    let link = ResolvedLink {
        id: LinkId::new(),
        target_url: "https://www.lazada.co.th/products/matcha-powder-123?utm_campaign=summer2025"
            .to_string(),
    };

    cache
        .put_link(&code, &link, Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(cache.get_link(&code).await.unwrap(), Some(link.clone()));

    let raw = cache.get("link:matcha-lz").await.unwrap().unwrap();
    assert!(raw.contains("\"targetUrl\""));

    cache.set("link:matcha-lz", "{broken", None).await.unwrap();
    let err = cache.get_link(&code).await.unwrap_err();
    assert!(matches!(err, CacheError::InvalidData(_)));
}

#[tokio::test]
async fn prefix_namespaces_keys() {
    let fixture = Fixture::start().await;
    let prefixed = RedisKvCache::with_prefix(fixture.conn.clone(), "affilink:");
    let plain = fixture.cache();

    prefixed.set("link:abc", "value", None).await.unwrap();

    assert!(plain.get("link:abc").await.unwrap().is_none());
    assert_eq!(
        plain.get("affilink:link:abc").await.unwrap().as_deref(),
        Some("value")
    );
}
