use crate::error::{LinkError, Result};
use crate::generator::Generator;
use affilink_core::{
    CampaignId, KvCache, Link, LinkCacheExt, LinkId, LinkKey, LinkSummary, Marketplace,
    ProductId, StorageError, Store, LINK_CACHE_TTL,
};
use async_trait::async_trait;
use jiff::Timestamp;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Generated codes tried before giving up on a create.
const MAX_CODE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateLink {
    pub product_id: ProductId,
    pub campaign_id: CampaignId,
    pub marketplace: Marketplace,
}

impl CreateLink {
    fn key(&self) -> LinkKey {
        LinkKey {
            product_id: self.product_id,
            campaign_id: self.campaign_id,
            marketplace: self.marketplace,
        }
    }
}

/// Outcome of [`LinkManager::create_link`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedLink {
    pub link: Link,
    /// `false` when the link for this product, campaign and marketplace
    /// already existed and was returned unchanged.
    pub created: bool,
}

#[async_trait]
pub trait LinkManager: Send + Sync + 'static {
    /// Creates the link for a product offer in a campaign, or returns the
    /// existing one.
    async fn create_link(&self, request: CreateLink) -> Result<CreatedLink>;

    /// Links newest first, optionally restricted to one campaign.
    async fn list_links(&self, campaign_id: Option<CampaignId>) -> Result<Vec<LinkSummary>>;

    /// Deletes a link and its clicks and drops its cache entry.
    async fn delete_link(&self, id: LinkId) -> Result<()>;
}

/// [`LinkManager`] over a [`Store`], a [`KvCache`] and a code [`Generator`].
pub struct LinkService<S, C, G> {
    store: Arc<S>,
    cache: Arc<C>,
    generator: Arc<G>,
    cache_ttl: Duration,
}

impl<S: Store, C: KvCache, G: Generator> LinkService<S, C, G> {
    pub fn new(store: Arc<S>, cache: Arc<C>, generator: G) -> Self {
        Self {
            store,
            cache,
            generator: Arc::new(generator),
            cache_ttl: LINK_CACHE_TTL,
        }
    }

    /// Overrides how long newly created links stay warm in the cache.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    async fn warm_cache(&self, link: &Link) {
        if let Err(e) = self
            .cache
            .put_link(&link.short_code, &link.resolved(), self.cache_ttl)
            .await
        {
            warn!(code = %link.short_code, error = %e, "Failed to warm link cache");
        }
    }
}

/// Rejects offers whose URL points at a different storefront.
fn check_offer_host(marketplace: Marketplace, url: &str) -> Result<()> {
    if marketplace.matches(url) {
        return Ok(());
    }
    let owner = Marketplace::detect(url)
        .map_or_else(|| "an unknown marketplace".to_string(), |other| other.to_string());
    Err(LinkError::InvalidUrl(format!(
        "'{url}' belongs to {owner}, not {marketplace}"
    )))
}

#[async_trait]
impl<S: Store, C: KvCache, G: Generator> LinkManager for LinkService<S, C, G> {
    async fn create_link(&self, request: CreateLink) -> Result<CreatedLink> {
        let CreateLink {
            product_id,
            campaign_id,
            marketplace,
        } = request;
        trace!(%product_id, %campaign_id, %marketplace, "Creating link");

        let offer = self
            .store
            .find_offer(product_id, marketplace)
            .await?
            .ok_or(LinkError::OfferNotFound {
                product_id,
                marketplace,
            })?;
        let campaign = self
            .store
            .get_campaign(campaign_id)
            .await?
            .ok_or(LinkError::CampaignNotFound(campaign_id))?;

        let key = request.key();
        if let Some(existing) = self.store.find_by_key(&key).await? {
            debug!(link_id = %existing.id, "Link already exists for offer and campaign");
            return Ok(CreatedLink {
                link: existing,
                created: false,
            });
        }

        let target_url =
            marketplace.build_affiliate_url(&offer.external_url, &campaign.utm_params())?;
        check_offer_host(marketplace, &offer.external_url)?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let now = Timestamp::now();
            let link = Link {
                id: LinkId::new(),
                product_id,
                campaign_id,
                marketplace,
                short_code: self.generator.generate(),
                target_url: target_url.clone(),
                created_at: now,
                updated_at: now,
            };

            match self.store.insert_link(&link).await {
                Ok(()) => {
                    info!(link_id = %link.id, code = %link.short_code, "Created link");
                    self.warm_cache(&link).await;
                    return Ok(CreatedLink {
                        link,
                        created: true,
                    });
                }
                Err(StorageError::Conflict(reason)) => {
                    // A concurrent create for the same offer wins; otherwise the code collided.
                    if let Some(winner) = self.store.find_by_key(&key).await? {
                        debug!(link_id = %winner.id, "Lost create race, returning existing link");
                        return Ok(CreatedLink {
                            link: winner,
                            created: false,
                        });
                    }
                    warn!(attempt, code = %link.short_code, %reason, "Short code collision");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(LinkError::Conflict(format!(
            "no free short code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    async fn list_links(&self, campaign_id: Option<CampaignId>) -> Result<Vec<LinkSummary>> {
        Ok(self.store.list_links(campaign_id).await?)
    }

    async fn delete_link(&self, id: LinkId) -> Result<()> {
        let link = self
            .store
            .get_link(id)
            .await?
            .ok_or(LinkError::LinkNotFound(id))?;

        if !self.store.delete_link(id).await? {
            return Err(LinkError::LinkNotFound(id));
        }

        // After the delete, so a concurrent miss cannot re-cache the link.
        if let Err(e) = self.cache.evict_link(&link.short_code).await {
            warn!(code = %link.short_code, error = %e, "Failed to evict deleted link from cache");
        }

        info!(link_id = %id, code = %link.short_code, "Deleted link");
        Ok(())
    }
}
