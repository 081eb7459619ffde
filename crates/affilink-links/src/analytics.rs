use crate::error::{LinkError, Result};
use affilink_core::{
    clicks_key, Campaign, CampaignId, KvCache, LinkId, LinkSummary, Marketplace, ShortCode, Store,
};
use async_trait::async_trait;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{Span, Timestamp};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{trace, warn};

/// Largest window [`Analytics::click_trends`] accepts.
pub const MAX_TREND_DAYS: u32 = 90;

/// Window used when the caller does not pick one.
pub const DEFAULT_TREND_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkClicks {
    pub link_id: LinkId,
    pub short_code: ShortCode,
    /// Durable click rows in the store.
    pub total_clicks: u64,
    /// The advisory `clicks:{linkId}` counter, if the cache has one.
    pub live_clicks: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketplaceStats {
    pub marketplace: Marketplace,
    pub total_links: u64,
    pub total_clicks: u64,
    /// Rounded to two decimals, 0 when there are no links.
    pub average_clicks_per_link: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignStats {
    pub campaign_id: CampaignId,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub total_links: u64,
    pub total_clicks: u64,
    /// Distinct products linked from the campaign.
    pub total_products: u64,
    /// Average clicks per link, rounded to two decimals.
    pub ctr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyClicks {
    /// UTC calendar day.
    pub date: Date,
    pub clicks: u64,
}

#[async_trait]
pub trait Analytics: Send + Sync + 'static {
    async fn link_clicks(&self, link_id: LinkId) -> Result<LinkClicks>;

    /// Stats for one campaign, or for every active campaign when `campaign_id`
    /// is `None`. An unknown id yields an empty list.
    async fn campaign_stats(
        &self,
        campaign_id: Option<CampaignId>,
    ) -> Result<Vec<CampaignStats>>;

    /// One entry per marketplace, in [`Marketplace::ALL`] order.
    async fn marketplace_comparison(&self) -> Result<Vec<MarketplaceStats>>;

    /// Clicks per UTC day for the last `days` days, oldest first.
    async fn click_trends(&self, days: u32) -> Result<Vec<DailyClicks>>;
}

pub struct AnalyticsService<S, C> {
    store: Arc<S>,
    cache: Arc<C>,
}

impl<S: Store, C: KvCache> AnalyticsService<S, C> {
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        Self { store, cache }
    }

    async fn live_clicks(&self, link_id: LinkId) -> Option<i64> {
        let key = clicks_key(link_id);
        match self.cache.get(&key).await {
            Ok(value) => value.and_then(|raw| raw.parse().ok()),
            Err(e) => {
                warn!(link_id = %link_id, error = %e, "Failed to read live click counter");
                None
            }
        }
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn average_per_link(total_clicks: u64, total_links: u64) -> f64 {
    if total_links == 0 {
        0.0
    } else {
        round_to_cents(total_clicks as f64 / total_links as f64)
    }
}

fn summarize_campaign(campaign: Campaign, links: &[LinkSummary]) -> CampaignStats {
    let total_links = links.len() as u64;
    let total_clicks = links.iter().map(|summary| summary.click_count).sum();
    let total_products = links
        .iter()
        .map(|summary| summary.link.product_id)
        .collect::<HashSet<_>>()
        .len() as u64;

    CampaignStats {
        campaign_id: campaign.id,
        name: campaign.name,
        slug: campaign.slug,
        is_active: campaign.is_active,
        total_links,
        total_clicks,
        total_products,
        ctr: average_per_link(total_clicks, total_links),
    }
}

fn trend_start(today: Date, days: u32) -> Result<Date> {
    if !(1..=MAX_TREND_DAYS).contains(&days) {
        return Err(LinkError::InvalidArgument(format!(
            "days must be between 1 and {MAX_TREND_DAYS}, got {days}"
        )));
    }
    today
        .checked_sub(Span::new().days(i64::from(days - 1)))
        .map_err(|e| LinkError::InvalidArgument(format!("invalid trend window: {e}")))
}

/// Counts `times` into zero-filled daily buckets from `start` through `today`.
fn bucket_by_day(start: Date, today: Date, times: &[Timestamp]) -> Vec<DailyClicks> {
    let mut buckets: BTreeMap<Date, u64> = start
        .series(Span::new().days(1))
        .take_while(|date| *date <= today)
        .map(|date| (date, 0))
        .collect();

    for ts in times {
        let date = ts.to_zoned(TimeZone::UTC).date();
        if let Some(count) = buckets.get_mut(&date) {
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(date, clicks)| DailyClicks { date, clicks })
        .collect()
}

#[async_trait]
impl<S: Store, C: KvCache> Analytics for AnalyticsService<S, C> {
    async fn link_clicks(&self, link_id: LinkId) -> Result<LinkClicks> {
        let link = self
            .store
            .get_link(link_id)
            .await?
            .ok_or(LinkError::LinkNotFound(link_id))?;
        let total_clicks = self.store.count_clicks(link_id).await?;
        let live_clicks = self.live_clicks(link_id).await;

        Ok(LinkClicks {
            link_id,
            short_code: link.short_code,
            total_clicks,
            live_clicks,
        })
    }

    async fn campaign_stats(&self, campaign_id: Option<CampaignId>) -> Result<Vec<CampaignStats>> {
        let campaigns: Vec<Campaign> = match campaign_id {
            Some(id) => self.store.get_campaign(id).await?.into_iter().collect(),
            None => self.store.list_active_campaigns().await?,
        };
        trace!(campaigns = campaigns.len(), "Summarizing campaigns");

        let mut stats = Vec::with_capacity(campaigns.len());
        for campaign in campaigns {
            let links = self.store.list_links(Some(campaign.id)).await?;
            stats.push(summarize_campaign(campaign, &links));
        }
        Ok(stats)
    }

    async fn marketplace_comparison(&self) -> Result<Vec<MarketplaceStats>> {
        let links = self.store.list_links(None).await?;
        trace!(links = links.len(), "Comparing marketplaces");

        Ok(Marketplace::ALL
            .into_iter()
            .map(|marketplace| {
                let (total_links, total_clicks) = links
                    .iter()
                    .filter(|summary| summary.link.marketplace == marketplace)
                    .fold((0u64, 0u64), |(links, clicks), summary| {
                        (links + 1, clicks + summary.click_count)
                    });
                MarketplaceStats {
                    marketplace,
                    total_links,
                    total_clicks,
                    average_clicks_per_link: average_per_link(total_clicks, total_links),
                }
            })
            .collect())
    }

    async fn click_trends(&self, days: u32) -> Result<Vec<DailyClicks>> {
        let today = Timestamp::now().to_zoned(TimeZone::UTC).date();
        let start = trend_start(today, days)?;
        let since = start
            .to_zoned(TimeZone::UTC)
            .map_err(|e| LinkError::InvalidArgument(format!("invalid trend window: {e}")))?
            .timestamp();

        let times = self.store.click_times_since(since).await?;
        trace!(days, clicks = times.len(), "Bucketing click trends");
        Ok(bucket_by_day(start, today, &times))
    }
}
