use affilink_core::{CampaignId, Link, LinkId, LinkSummary, Marketplace, ProductId};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub product_id: ProductId,
    pub campaign_id: CampaignId,
    /// Case-insensitive, e.g. `LAZADA` or `shopee`.
    pub marketplace: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLinksQuery {
    pub campaign_id: Option<CampaignId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub id: LinkId,
    pub product_id: ProductId,
    pub campaign_id: CampaignId,
    pub marketplace: Marketplace,
    pub short_code: String,
    /// Relative redirect path, e.g. `/go/matcha-lz`.
    pub short_url: String,
    pub target_url: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            product_id: link.product_id,
            campaign_id: link.campaign_id,
            marketplace: link.marketplace,
            short_url: link.short_code.short_path(),
            short_code: link.short_code.as_str().to_string(),
            target_url: link.target_url,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSummaryResponse {
    #[serde(flatten)]
    pub link: LinkResponse,
    pub click_count: u64,
}

impl From<LinkSummary> for LinkSummaryResponse {
    fn from(summary: LinkSummary) -> Self {
        Self {
            link: summary.link.into(),
            click_count: summary.click_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteLinkResponse {
    pub message: &'static str,
}
