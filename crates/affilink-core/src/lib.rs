//! Core types and traits for the affilink redirect service.
//!
//! This crate provides the domain model, the store and cache contracts, and
//! the marketplace table shared by the redirector, link management and
//! gateway crates.

pub mod cache;
pub mod error;
pub mod marketplace;
pub mod model;
pub mod repository;
pub mod shortcode;

pub use cache::{clicks_key, link_key, KvCache, LinkCacheExt, LINK_CACHE_TTL};
pub use error::{CacheError, MarketplaceError, ShortCodeError, StorageError};
pub use marketplace::{Marketplace, UtmParams};
pub use model::{
    Campaign, CampaignId, Click, ClickId, ClientHash, Link, LinkId, LinkKey, LinkSummary,
    NewClick, Offer, ProductId, ResolvedLink,
};
pub use repository::{
    CatalogRepository, ClickRepository, LinkRepository, ReadRepository, Store,
};
pub use shortcode::ShortCode;
