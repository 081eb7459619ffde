use affilink_links::DEFAULT_TREND_DAYS;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use crate::error::{AppError, Result};
use crate::model::{
    CampaignStatsQuery, CampaignStatsResponse, DailyClicksResponse, MarketplaceStatsResponse,
    TrendsQuery,
};
use crate::state::AppState;

/// Every active campaign, or only `campaignId` when given.
pub async fn campaign_stats_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<CampaignStatsQuery>, QueryRejection>,
) -> Result<Json<Vec<CampaignStatsResponse>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let stats = state.analytics().campaign_stats(query.campaign_id).await?;
    Ok(Json(stats.into_iter().map(Into::into).collect()))
}

pub async fn marketplace_comparison_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<MarketplaceStatsResponse>>> {
    let stats = state.analytics().marketplace_comparison().await?;
    Ok(Json(stats.into_iter().map(Into::into).collect()))
}

pub async fn click_trends_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<TrendsQuery>, QueryRejection>,
) -> Result<Json<Vec<DailyClicksResponse>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    let trends = state.analytics().click_trends(days).await?;
    Ok(Json(trends.into_iter().map(Into::into).collect()))
}
