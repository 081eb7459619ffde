use crate::error::StorageError;
use crate::marketplace::Marketplace;
use crate::model::{
    Campaign, CampaignId, Click, LinkId, LinkKey, LinkSummary, NewClick, Offer, ProductId,
};
use crate::shortcode::ShortCode;
use crate::Link;
use async_trait::async_trait;
use jiff::Timestamp;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// The read side of link storage used on the redirect path.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the link for a short code.
    /// Returns `None` if the code does not exist.
    async fn get_by_short_code(&self, code: &ShortCode) -> Result<Option<Link>>;

    /// Retrieves a link by its identifier.
    async fn get_link(&self, id: LinkId) -> Result<Option<Link>>;
}

#[async_trait]
pub trait LinkRepository: ReadRepository {
    /// Looks up the link for a (product, campaign, marketplace) triple.
    async fn find_by_key(&self, key: &LinkKey) -> Result<Option<Link>>;

    /// Inserts a new link.
    ///
    /// Returns `Err(Conflict)` if the short code or the link key is taken.
    async fn insert_link(&self, link: &Link) -> Result<()>;

    /// Deletes a link and, with it, all of its clicks.
    /// Returns `true` if the link existed.
    async fn delete_link(&self, id: LinkId) -> Result<bool>;

    /// Lists links newest first, optionally restricted to one campaign.
    async fn list_links(&self, campaign_id: Option<CampaignId>) -> Result<Vec<LinkSummary>>;
}

#[async_trait]
pub trait ClickRepository: Send + Sync + 'static {
    /// Appends one click row and returns it with its assigned id.
    async fn insert_click(&self, click: NewClick) -> Result<Click>;

    /// Counts the durable clicks of a link.
    async fn count_clicks(&self, link_id: LinkId) -> Result<u64>;

    /// Returns the timestamps of every click at or after `since`.
    async fn click_times_since(&self, since: Timestamp) -> Result<Vec<Timestamp>>;
}

/// Read access to the product and campaign catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync + 'static {
    async fn find_offer(
        &self,
        product_id: ProductId,
        marketplace: Marketplace,
    ) -> Result<Option<Offer>>;

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>>;

    /// Campaigns with `is_active` set, ordered by name.
    async fn list_active_campaigns(&self) -> Result<Vec<Campaign>>;
}

/// Everything the service layer needs from a persistent store.
pub trait Store: LinkRepository + ClickRepository + CatalogRepository {}

impl<T> Store for T where T: LinkRepository + ClickRepository + CatalogRepository {}
