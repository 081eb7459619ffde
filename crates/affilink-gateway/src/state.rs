use std::sync::Arc;
use std::time::Duration;

use affilink_core::{KvCache, Store};
use affilink_links::{Analytics, AnalyticsService, LinkManager, LinkService, NanoidGenerator};
use affilink_redirector::{ClickDispatcher, ClickRecorder, LinkResolver, Redirector};

#[derive(Clone)]
pub struct AppState {
    redirector: Arc<dyn Redirector>,
    clicks: ClickDispatcher,
    links: Arc<dyn LinkManager>,
    analytics: Arc<dyn Analytics>,
}

impl AppState {
    pub fn new(
        redirector: Arc<dyn Redirector>,
        clicks: ClickDispatcher,
        links: Arc<dyn LinkManager>,
        analytics: Arc<dyn Analytics>,
    ) -> Self {
        Self {
            redirector,
            clicks,
            links,
            analytics,
        }
    }

    /// Wires every service onto one store and one cache.
    pub fn from_backends<S: Store, C: KvCache>(
        store: Arc<S>,
        cache: Arc<C>,
        link_cache_ttl: Duration,
    ) -> Self {
        let redirector =
            LinkResolver::with_ttl(Arc::clone(&store), Arc::clone(&cache), link_cache_ttl);
        let recorder = ClickRecorder::new(Arc::clone(&store), Arc::clone(&cache));
        let links = LinkService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            NanoidGenerator::default(),
        )
        .with_cache_ttl(link_cache_ttl);
        let analytics = AnalyticsService::new(store, cache);

        Self::new(
            Arc::new(redirector),
            ClickDispatcher::new(Arc::new(recorder)),
            Arc::new(links),
            Arc::new(analytics),
        )
    }

    pub fn redirector(&self) -> &dyn Redirector {
        self.redirector.as_ref()
    }

    pub fn clicks(&self) -> &ClickDispatcher {
        &self.clicks
    }

    pub fn links(&self) -> &dyn LinkManager {
        self.links.as_ref()
    }

    pub fn analytics(&self) -> &dyn Analytics {
        self.analytics.as_ref()
    }
}
