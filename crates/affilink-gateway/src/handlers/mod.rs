mod analytics;
mod health;
mod links;
mod redirect;

pub use analytics::{
    campaign_stats_handler, click_trends_handler, marketplace_comparison_handler,
};
pub use health::health_handler;
pub use links::{create_link_handler, delete_link_handler, link_clicks_handler, list_links_handler};
pub use redirect::redirect_handler;
