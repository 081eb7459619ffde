mod analytics;
mod link;

pub use analytics::{
    CampaignStatsQuery, CampaignStatsResponse, DailyClicksResponse, LinkClicksResponse,
    MarketplaceStatsResponse, TrendsQuery,
};
pub use link::{
    CreateLinkRequest, DeleteLinkResponse, LinkResponse, LinkSummaryResponse, ListLinksQuery,
};

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
