use affilink_core::{CampaignId, LinkId, Marketplace, MarketplaceError, ProductId, StorageError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LinkError>;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("No offer found for {marketplace} marketplace")]
    OfferNotFound {
        product_id: ProductId,
        marketplace: Marketplace,
    },
    #[error("Campaign not found")]
    CampaignNotFound(CampaignId),
    #[error("Link not found")]
    LinkNotFound(LinkId),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<MarketplaceError> for LinkError {
    fn from(value: MarketplaceError) -> Self {
        match value {
            MarketplaceError::InvalidUrl { url, reason } => {
                Self::InvalidUrl(format!("'{url}': {reason}"))
            }
            MarketplaceError::Unknown(name) => {
                Self::InvalidArgument(format!("unknown marketplace: {name}"))
            }
        }
    }
}
