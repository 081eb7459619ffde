//! Link management and click analytics.
//!
//! [`LinkService`] creates, lists and deletes affiliate links, keeping the
//! `link:{code}` cache entries in step. [`AnalyticsService`] aggregates the
//! durable click rows.

pub mod analytics;
pub mod error;
pub mod generator;
pub mod service;

pub use analytics::{
    Analytics, AnalyticsService, CampaignStats, DailyClicks, LinkClicks, MarketplaceStats,
    DEFAULT_TREND_DAYS, MAX_TREND_DAYS,
};
pub use error::{LinkError, Result};
pub use generator::{Generator, NanoidGenerator};
pub use service::{CreateLink, CreatedLink, LinkManager, LinkService};
