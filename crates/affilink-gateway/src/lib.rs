//! HTTP surface of the affiliate link service.
//!
//! - `GET /go/{shortCode}` redirects and records the click in the background
//! - `/v1/links` creates, lists and deletes links
//! - `/v1/analytics` serves click aggregates

pub mod app;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
