use affilink_core::{LinkId, Marketplace};
use affilink_links::{CreateLink, LinkError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{AppError, Result};
use crate::model::{
    CreateLinkRequest, DeleteLinkResponse, LinkClicksResponse, LinkResponse, LinkSummaryResponse,
    ListLinksQuery,
};
use crate::state::AppState;

/// Unparseable ids cannot name a stored link.
fn parse_link_id(raw: &str) -> Result<LinkId> {
    raw.parse::<LinkId>()
        .map_err(|_| AppError::NotFound("Link not found".to_string()))
}

pub async fn create_link_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LinkResponse>)> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let marketplace: Marketplace = request.marketplace.parse().map_err(LinkError::from)?;

    let created = state
        .links()
        .create_link(CreateLink {
            product_id: request.product_id,
            campaign_id: request.campaign_id,
            marketplace,
        })
        .await?;

    let status = if created.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(created.link.into())))
}

pub async fn list_links_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListLinksQuery>, QueryRejection>,
) -> Result<Json<Vec<LinkSummaryResponse>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let links = state.links().list_links(query.campaign_id).await?;
    Ok(Json(links.into_iter().map(Into::into).collect()))
}

pub async fn delete_link_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeleteLinkResponse>> {
    let id = parse_link_id(&id)?;
    state.links().delete_link(id).await?;
    Ok(Json(DeleteLinkResponse {
        message: "Link deleted successfully",
    }))
}

pub async fn link_clicks_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkClicksResponse>> {
    let id = parse_link_id(&id)?;
    let stats = state.analytics().link_clicks(id).await?;
    Ok(Json(stats.into()))
}
