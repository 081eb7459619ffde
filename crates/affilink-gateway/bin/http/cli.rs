use affilink_telemetry::LogFormat;
use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "AFFILINK_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "AFFILINK_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "AFFILINK_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "AFFILINK_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "AFFILINK_REDIS_URL";
pub const REDIS_KEY_PREFIX_ENV: &str = "AFFILINK_REDIS_KEY_PREFIX";
pub const MOKA_CAPACITY_ENV: &str = "AFFILINK_MOKA_CAPACITY";
pub const LINK_CACHE_TTL_ENV: &str = "AFFILINK_LINK_CACHE_TTL_SECS";
pub const LOG_FORMAT_ENV: &str = "AFFILINK_LOG_FORMAT";
pub const OTLP_ENDPOINT_ENV: &str = "AFFILINK_OTLP_ENDPOINT";
pub const SEED_DEMO_ENV: &str = "AFFILINK_SEED_DEMO";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_MOKA_CAPACITY: u64 = 10_000;
pub const DEFAULT_LINK_CACHE_TTL_SECS: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "moka")]
    Moka,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Moka => write!(f, "moka"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "affilink-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Moka
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    #[arg(long, env = REDIS_KEY_PREFIX_ENV, default_value = "")]
    pub redis_key_prefix: String,

    #[arg(long, env = MOKA_CAPACITY_ENV, default_value_t = DEFAULT_MOKA_CAPACITY)]
    pub moka_capacity: u64,

    #[arg(long, env = LINK_CACHE_TTL_ENV, default_value_t = DEFAULT_LINK_CACHE_TTL_SECS)]
    pub link_cache_ttl_secs: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    #[arg(long, env = OTLP_ENDPOINT_ENV)]
    pub otlp_endpoint: Option<String>,

    /// Load the demo catalog into the in-memory store.
    #[arg(long, env = SEED_DEMO_ENV)]
    pub seed_demo: bool,
}

impl CLI {
    pub fn link_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.link_cache_ttl_secs)
    }
}
