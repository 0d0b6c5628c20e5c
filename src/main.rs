//! Mini LRU walkthrough
//!
//! Replays the reference session against a small cache: two inserts, a hit,
//! both entries expiring, a fresh insert, then the dump and the stats.
//!
//! Capacity and TTL are fixed so the session is reproducible; lock fairness
//! and the sweeper interval come from the environment (see `CacheConfig`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_lru::{spawn_cleanup_task, CacheConfig, LruCache};

const WALKTHROUGH_CAPACITY: usize = 2;
const WALKTHROUGH_TTL_SECS: u64 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_lru=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig {
        capacity: WALKTHROUGH_CAPACITY,
        ttl_secs: Some(WALKTHROUGH_TTL_SECS),
        ..CacheConfig::from_env()
    };
    info!(
        "Configuration loaded: capacity={}, ttl={:?}, lock={}, cleanup_interval={}s",
        config.capacity,
        config.ttl(),
        config.fairness,
        config.cleanup_interval
    );

    let cache: Arc<LruCache<u32, String>> =
        Arc::new(LruCache::from_config(&config).context("invalid cache configuration")?);

    let cleanup_handle = config
        .cleanup_interval()
        .map(|interval| spawn_cleanup_task(cache.clone(), interval));

    cache.put(1, "A".to_string());
    cache.put(2, "B".to_string());
    info!("Cache contents:\n{}", cache.dump());

    info!("get(1) -> {:?}", cache.get(&1));

    tokio::time::sleep(Duration::from_secs(WALKTHROUGH_TTL_SECS + 1)).await;
    if cache.get(&1).is_none() {
        info!("Key 1 has expired");
    }
    if cache.get(&2).is_none() {
        info!("Key 2 has expired");
    }

    cache.put(3, "C".to_string());
    info!("get(3) -> {:?}", cache.get(&3));
    info!("Cache contents:\n{}", cache.dump());

    let stats = serde_json::to_string_pretty(&cache.stats())?;
    info!("Stats: {}", stats);

    if let Some(handle) = cleanup_handle {
        handle.abort();
    }
    Ok(())
}
