//! The redirect hot path: resolving short codes and recording clicks.
//!
//! [`LinkResolver`] reads `link:{code}` from a [`KvCache`](affilink_core::KvCache)
//! and falls back to the store on a miss, repopulating the cache.
//! [`ClickRecorder`] persists one click row per call and bumps the advisory
//! `clicks:{linkId}` counter. [`ClickDispatcher`] runs recordings as detached
//! background tasks so a redirect never waits on them.
//!
//! Both collaborators are injected, so tests run against the in-memory store
//! and the Moka cache:
//!
//! ```rust
//! use std::sync::Arc;
//! use affilink_cache::MokaKvCache;
//! use affilink_core::ShortCode;
//! use affilink_redirector::{LinkResolver, Redirector, RedirectorError};
//! use affilink_storage::InMemoryRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = LinkResolver::new(
//!     Arc::new(InMemoryRepository::new()),
//!     Arc::new(MokaKvCache::new()),
//! );
//!
//! let code = ShortCode::new("matcha-lz")?;
//! match resolver.resolve(&code).await {
//!     Ok(link) => println!("Redirect to: {}", link.target_url),
//!     Err(RedirectorError::NotFound(_)) => println!("Link not found"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod error;
pub mod recorder;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use dispatcher::ClickDispatcher;
pub use error::{RecordingError, RedirectorError, Result};
pub use recorder::{hash_client_address, ClickEvent, ClickRecorder, ClickSink};
pub use resolver::{LinkResolver, Redirector};
