use affilink_core::{CampaignId, LinkId, Marketplace};
use affilink_links::{CampaignStats, DailyClicks, LinkClicks, MarketplaceStats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct TrendsQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStatsQuery {
    pub campaign_id: Option<CampaignId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStatsResponse {
    pub campaign_id: CampaignId,
    pub campaign_name: String,
    pub slug: String,
    pub is_active: bool,
    pub total_links: u64,
    pub total_clicks: u64,
    pub total_products: u64,
    pub ctr: f64,
}

impl From<CampaignStats> for CampaignStatsResponse {
    fn from(stats: CampaignStats) -> Self {
        Self {
            campaign_id: stats.campaign_id,
            campaign_name: stats.name,
            slug: stats.slug,
            is_active: stats.is_active,
            total_links: stats.total_links,
            total_clicks: stats.total_clicks,
            total_products: stats.total_products,
            ctr: stats.ctr,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkClicksResponse {
    pub link_id: LinkId,
    pub short_code: String,
    pub total_clicks: u64,
    /// Advisory counter from the cache; `null` when the cache has none.
    pub live_clicks: Option<i64>,
}

impl From<LinkClicks> for LinkClicksResponse {
    fn from(stats: LinkClicks) -> Self {
        Self {
            link_id: stats.link_id,
            short_code: stats.short_code.as_str().to_string(),
            total_clicks: stats.total_clicks,
            live_clicks: stats.live_clicks,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceStatsResponse {
    pub marketplace: Marketplace,
    pub total_links: u64,
    pub total_clicks: u64,
    pub average_clicks_per_link: f64,
}

impl From<MarketplaceStats> for MarketplaceStatsResponse {
    fn from(stats: MarketplaceStats) -> Self {
        Self {
            marketplace: stats.marketplace,
            total_links: stats.total_links,
            total_clicks: stats.total_clicks,
            average_clicks_per_link: stats.average_clicks_per_link,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyClicksResponse {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    pub clicks: u64,
}

impl From<DailyClicks> for DailyClicksResponse {
    fn from(day: DailyClicks) -> Self {
        Self {
            date: day.date.to_string(),
            clicks: day.clicks,
        }
    }
}
