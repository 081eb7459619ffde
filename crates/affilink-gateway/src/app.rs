use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    campaign_stats_handler, click_trends_handler, create_link_handler, delete_link_handler,
    health_handler, link_clicks_handler, list_links_handler, marketplace_comparison_handler,
    redirect_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/go/{short_code}", get(redirect_handler))
            .nest(
                "/v1",
                Router::new()
                    .route("/links", post(create_link_handler).get(list_links_handler))
                    .route("/links/{id}", delete(delete_link_handler))
                    .route("/links/{id}/clicks", get(link_clicks_handler))
                    .route("/analytics/campaigns", get(campaign_stats_handler))
                    .route("/analytics/marketplaces", get(marketplace_comparison_handler))
                    .route("/analytics/trends", get(click_trends_handler)),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
