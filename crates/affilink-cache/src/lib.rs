//! [`KvCache`](affilink_core::KvCache) backends.
//!
//! - [`RedisKvCache`] for shared deployments, speaking plain
//!   `GET`/`SET EX`/`DEL`/`INCR`.
//! - [`MokaKvCache`] for single-node deployments and tests, with the same
//!   per-entry TTL and counter semantics kept in process.

pub mod moka;
pub mod redis;

pub use self::moka::{CacheConfig, MokaKvCache};
pub use self::redis::RedisKvCache;
