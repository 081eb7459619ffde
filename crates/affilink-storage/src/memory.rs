use affilink_core::repository::{
    CatalogRepository, ClickRepository, LinkRepository, ReadRepository, Result,
};
use affilink_core::{
    Campaign, CampaignId, Click, Link, LinkId, LinkKey, LinkSummary, Marketplace, NewClick,
    Offer, ProductId, ShortCode, StorageError,
};
use async_trait::async_trait;
use dashmap::DashMap;
use jiff::Timestamp;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A link together with the clicks recorded against it.
///
/// Keeping clicks inside the link entry makes deletion cascade for free.
#[derive(Debug)]
struct LinkEntry {
    link: Link,
    clicks: Vec<Click>,
}

#[derive(Debug, Default)]
struct Inner {
    links: DashMap<LinkId, LinkEntry>,
    by_code: DashMap<ShortCode, LinkId>,
    by_key: DashMap<LinkKey, LinkId>,
    offers: DashMap<(ProductId, Marketplace), Offer>,
    campaigns: DashMap<CampaignId, Campaign>,
    next_click_id: AtomicU64,
    // Serializes link inserts and deletes so the three link maps agree.
    link_writes: Mutex<()>,
}

/// In-memory implementation of every store contract, backed by DashMap.
///
/// Clones share the same data. Reads never take the write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Inner>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an offer in the catalog.
    pub fn put_offer(&self, offer: Offer) {
        self.inner
            .offers
            .insert((offer.product_id, offer.marketplace), offer);
    }

    /// Adds or replaces a campaign in the catalog.
    pub fn put_campaign(&self, campaign: Campaign) {
        self.inner.campaigns.insert(campaign.id, campaign);
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get_by_short_code(&self, code: &ShortCode) -> Result<Option<Link>> {
        let Some(id) = self.inner.by_code.get(code).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.inner.links.get(&id).map(|entry| entry.link.clone()))
    }

    async fn get_link(&self, id: LinkId) -> Result<Option<Link>> {
        Ok(self.inner.links.get(&id).map(|entry| entry.link.clone()))
    }
}

#[async_trait]
impl LinkRepository for InMemoryRepository {
    async fn find_by_key(&self, key: &LinkKey) -> Result<Option<Link>> {
        let Some(id) = self.inner.by_key.get(key).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.inner.links.get(&id).map(|entry| entry.link.clone()))
    }

    async fn insert_link(&self, link: &Link) -> Result<()> {
        let _guard = self.inner.link_writes.lock();

        if self.inner.by_code.contains_key(&link.short_code) {
            return Err(StorageError::Conflict(format!(
                "short code '{}' is taken",
                link.short_code
            )));
        }
        let key = link.key();
        if self.inner.by_key.contains_key(&key) {
            return Err(StorageError::Conflict(format!(
                "link for product {} in campaign {} on {} already exists",
                key.product_id, key.campaign_id, key.marketplace
            )));
        }

        self.inner.by_code.insert(link.short_code.clone(), link.id);
        self.inner.by_key.insert(key, link.id);
        self.inner.links.insert(
            link.id,
            LinkEntry {
                link: link.clone(),
                clicks: Vec::new(),
            },
        );
        Ok(())
    }

    async fn delete_link(&self, id: LinkId) -> Result<bool> {
        let _guard = self.inner.link_writes.lock();

        let Some((_, entry)) = self.inner.links.remove(&id) else {
            return Ok(false);
        };
        self.inner.by_code.remove(&entry.link.short_code);
        self.inner.by_key.remove(&entry.link.key());
        Ok(true)
    }

    async fn list_links(&self, campaign_id: Option<CampaignId>) -> Result<Vec<LinkSummary>> {
        let mut summaries: Vec<LinkSummary> = self
            .inner
            .links
            .iter()
            .filter(|entry| campaign_id.is_none_or(|id| entry.link.campaign_id == id))
            .map(|entry| LinkSummary {
                link: entry.link.clone(),
                click_count: entry.clicks.len() as u64,
            })
            .collect();

        summaries.sort_by(|a, b| b.link.created_at.cmp(&a.link.created_at));
        Ok(summaries)
    }
}

#[async_trait]
impl ClickRepository for InMemoryRepository {
    async fn insert_click(&self, click: NewClick) -> Result<Click> {
        let Some(mut entry) = self.inner.links.get_mut(&click.link_id) else {
            return Err(StorageError::Query(format!(
                "link {} does not exist",
                click.link_id
            )));
        };

        let id = self.inner.next_click_id.fetch_add(1, Ordering::Relaxed) + 1;
        let click = Click::from_new(id, click);
        entry.clicks.push(click.clone());
        Ok(click)
    }

    async fn count_clicks(&self, link_id: LinkId) -> Result<u64> {
        Ok(self
            .inner
            .links
            .get(&link_id)
            .map_or(0, |entry| entry.clicks.len() as u64))
    }

    async fn click_times_since(&self, since: Timestamp) -> Result<Vec<Timestamp>> {
        Ok(self
            .inner
            .links
            .iter()
            .flat_map(|entry| {
                entry
                    .clicks
                    .iter()
                    .map(|click| click.timestamp)
                    .filter(|ts| *ts >= since)
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn find_offer(
        &self,
        product_id: ProductId,
        marketplace: Marketplace,
    ) -> Result<Option<Offer>> {
        Ok(self
            .inner
            .offers
            .get(&(product_id, marketplace))
            .map(|offer| offer.clone()))
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>> {
        Ok(self.inner.campaigns.get(&id).map(|c| c.clone()))
    }

    async fn list_active_campaigns(&self) -> Result<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .inner
            .campaigns
            .iter()
            .filter(|entry| entry.is_active)
            .map(|entry| entry.value().clone())
            .collect();
        campaigns.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(campaigns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn link(code: &str, campaign_id: CampaignId, created_at: Timestamp) -> Link {
        Link {
            id: LinkId::new(),
            product_id: ProductId::new(),
            campaign_id,
            marketplace: Marketplace::Lazada,
            short_code: ShortCode::new_unchecked(code),
            target_url: format!("https://www.lazada.co.th/{code}?utm_campaign=c"),
            created_at,
            updated_at: created_at,
        }
    }

    fn click(link_id: LinkId, timestamp: Timestamp) -> NewClick {
        NewClick {
            link_id,
            timestamp,
            referrer: None,
            user_agent: Some("test-agent".to_string()),
            client_hash: None,
        }
    }

    #[tokio::test]
    async fn insert_and_lookup_by_code_id_and_key() {
        let repo = InMemoryRepository::new();
        let link = link("abc", CampaignId::new(), Timestamp::now());
        repo.insert_link(&link).await.unwrap();

        let code = ShortCode::new_unchecked("abc");
        assert_eq!(repo.get_by_short_code(&code).await.unwrap(), Some(link.clone()));
        assert_eq!(repo.get_link(link.id).await.unwrap(), Some(link.clone()));
        assert_eq!(repo.find_by_key(&link.key()).await.unwrap(), Some(link));

        let missing = ShortCode::new_unchecked("nope");
        assert!(repo.get_by_short_code(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_rejects_taken_code_and_taken_key() {
        let repo = InMemoryRepository::new();
        let first = link("abc", CampaignId::new(), Timestamp::now());
        repo.insert_link(&first).await.unwrap();

        let same_code = link("abc", CampaignId::new(), Timestamp::now());
        let err = repo.insert_link(&same_code).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        let mut same_key = first.clone();
        same_key.id = LinkId::new();
        same_key.short_code = ShortCode::new_unchecked("other");
        let err = repo.insert_link(&same_key).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        let code = ShortCode::new_unchecked("other");
        assert!(repo.get_by_short_code(&code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_cascades_clicks_and_frees_code() {
        let repo = InMemoryRepository::new();
        let link = link("abc", CampaignId::new(), Timestamp::now());
        repo.insert_link(&link).await.unwrap();
        repo.insert_click(click(link.id, Timestamp::now())).await.unwrap();

        assert!(repo.delete_link(link.id).await.unwrap());
        assert!(!repo.delete_link(link.id).await.unwrap());
        assert_eq!(repo.count_clicks(link.id).await.unwrap(), 0);
        assert!(repo
            .click_times_since(Timestamp::UNIX_EPOCH)
            .await
            .unwrap()
            .is_empty());

        let code = ShortCode::new_unchecked("abc");
        assert!(repo.get_by_short_code(&code).await.unwrap().is_none());
        repo.insert_link(&link).await.unwrap();
    }

    #[tokio::test]
    async fn click_ids_increase_and_counts_track_inserts() {
        let repo = InMemoryRepository::new();
        let link = link("abc", CampaignId::new(), Timestamp::now());
        repo.insert_link(&link).await.unwrap();

        let first = repo.insert_click(click(link.id, Timestamp::now())).await.unwrap();
        let second = repo.insert_click(click(link.id, Timestamp::now())).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(second.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(repo.count_clicks(link.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn click_for_unknown_link_is_rejected() {
        let repo = InMemoryRepository::new();
        let err = repo
            .insert_click(click(LinkId::new(), Timestamp::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Query(_)));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filters_by_campaign() {
        let repo = InMemoryRepository::new();
        let summer = CampaignId::new();
        let winter = CampaignId::new();
        let now = Timestamp::now();

        let old = link("old", summer, now - SignedDuration::from_secs(60));
        let new = link("new", summer, now);
        let other = link("other", winter, now - SignedDuration::from_secs(30));
        for l in [&old, &new, &other] {
            repo.insert_link(l).await.unwrap();
        }
        repo.insert_click(click(new.id, now)).await.unwrap();

        let all = repo.list_links(None).await.unwrap();
        let codes: Vec<_> = all.iter().map(|s| s.link.short_code.as_str()).collect();
        assert_eq!(codes, ["new", "other", "old"]);

        let summer_links = repo.list_links(Some(summer)).await.unwrap();
        assert_eq!(summer_links.len(), 2);
        assert_eq!(summer_links[0].link.id, new.id);
        assert_eq!(summer_links[0].click_count, 1);
        assert_eq!(summer_links[1].click_count, 0);
    }

    #[tokio::test]
    async fn click_times_since_filters_older_clicks() {
        let repo = InMemoryRepository::new();
        let link = link("abc", CampaignId::new(), Timestamp::now());
        repo.insert_link(&link).await.unwrap();

        let now = Timestamp::now();
        let day = SignedDuration::from_hours(24);
        repo.insert_click(click(link.id, now - day * 3)).await.unwrap();
        repo.insert_click(click(link.id, now)).await.unwrap();

        let times = repo.click_times_since(now - day).await.unwrap();
        assert_eq!(times, vec![now]);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let repo = InMemoryRepository::new();
        let clone = repo.clone();
        let link = link("abc", CampaignId::new(), Timestamp::now());
        clone.insert_link(&link).await.unwrap();

        assert!(repo.get_link(link.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn catalog_lookups() {
        let repo = InMemoryRepository::new();
        let product_id = ProductId::new();
        repo.put_offer(Offer {
            product_id,
            marketplace: Marketplace::Shopee,
            store_name: "Matcha House".to_string(),
            external_url: "https://shopee.co.th/matcha".to_string(),
        });
        let campaign = Campaign {
            id: CampaignId::new(),
            name: "Summer".to_string(),
            slug: "summer".to_string(),
            utm_campaign: "summer2025".to_string(),
            utm_source: None,
            utm_medium: None,
            is_active: true,
        };
        repo.put_campaign(campaign.clone());

        let offer = repo
            .find_offer(product_id, Marketplace::Shopee)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(offer.store_name, "Matcha House");
        assert!(repo
            .find_offer(product_id, Marketplace::Lazada)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            repo.get_campaign(campaign.id).await.unwrap(),
            Some(campaign)
        );
    }

    #[tokio::test]
    async fn active_campaigns_are_listed_by_name() {
        let repo = InMemoryRepository::new();
        for (name, is_active) in [("Winter", true), ("Autumn", false), ("Spring", true)] {
            repo.put_campaign(Campaign {
                id: CampaignId::new(),
                name: name.to_string(),
                slug: name.to_lowercase(),
                utm_campaign: name.to_lowercase(),
                utm_source: None,
                utm_medium: None,
                is_active,
            });
        }

        let names: Vec<String> = repo
            .list_active_campaigns()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names, ["Spring", "Winter"]);
    }
}
