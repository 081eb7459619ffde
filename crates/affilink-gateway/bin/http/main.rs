mod cli;

use crate::cli::{CacheBackendArg, StorageBackendArg, CLI};
use affilink_cache::{MokaKvCache, RedisKvCache};
use affilink_core::{KvCache, Store};
use affilink_gateway::{App, AppState};
use affilink_storage::seed::seed_demo;
use affilink_storage::{InMemoryRepository, MySqlRepository};
use affilink_telemetry::TelemetryConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = CLI::parse();

    let _telemetry = affilink_telemetry::init(
        TelemetryConfig::builder()
            .service_name("affilink-gateway")
            .log_format(config.log_format.into())
            .otlp_endpoint(config.otlp_endpoint.clone())
            .build(),
    )?;

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        "starting gateway server"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            let store = InMemoryRepository::new();
            if config.seed_demo {
                seed_demo(&store).await?;
            }
            with_cache(&config, Arc::new(store)).await?;
        }
        StorageBackendArg::Mysql => {
            if config.seed_demo {
                warn!("--seed-demo only applies to the in-memory store, ignoring");
            }
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .ok_or("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlRepository::connect(mysql_dsn).await?;
            store.ensure_schema().await?;
            with_cache(&config, Arc::new(store)).await?;
        }
    }

    Ok(())
}

async fn with_cache<S: Store>(
    config: &CLI,
    store: Arc<S>,
) -> Result<(), Box<dyn std::error::Error>> {
    match config.cache {
        CacheBackendArg::Moka => {
            let cache = MokaKvCache::with_capacity(config.moka_capacity);
            run_server(config, store, Arc::new(cache)).await
        }
        CacheBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .ok_or("redis url is required when cache backend is redis")?;
            let cache = RedisKvCache::connect(redis_url)
                .await?
                .prefixed(config.redis_key_prefix.as_str());
            run_server(config, store, Arc::new(cache)).await
        }
    }
}

async fn run_server<S: Store, C: KvCache>(
    config: &CLI,
    store: Arc<S>,
    cache: Arc<C>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::from_backends(store, cache, config.link_cache_ttl());
    let app = App::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}
